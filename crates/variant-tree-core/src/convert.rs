//! Conversion of a value to another type.
//!
//! Used when the type of a node is edited. Atomic values convert when the
//! result is representable; an atomic value changed into a container becomes
//! the empty container of that kind; containers convert between kinds but
//! never into atomic values.

use std::sync::Arc;

use crate::address::Key;
use crate::container::ContainerRef;
use crate::error::{Result, TreeError};
use crate::value::{OrderedMap, UnorderedMap, Variant, VariantType};

/// Convert `value` to `target`.
///
/// # Errors
///
/// [`TreeError::TypeConversionUnsupported`] if the value has no meaningful
/// representation in the target type.
pub fn convert(value: &Variant, target: VariantType) -> Result<Variant> {
    let source = value.type_tag();
    if source == target {
        return Ok(value.clone());
    }
    let unsupported = || TreeError::conversion(source, target);

    match (value, target) {
        (_, VariantType::Invalid) => Ok(Variant::Invalid),
        (Variant::Invalid, _) => Ok(Variant::default_for(target)),
        (_, ty) if ty.is_container() && value.is_atomic() => Ok(Variant::default_for(ty)),
        (_, ty) if ty.is_container() => convert_container(value, ty).ok_or_else(unsupported),
        _ if value.is_container() => Err(unsupported()),
        (_, VariantType::String) => Ok(Variant::String(value.plain_text())),
        (_, VariantType::Bool) => to_bool(value).map(Variant::Bool).ok_or_else(unsupported),
        (_, VariantType::Int) => to_int(value).map(Variant::Int).ok_or_else(unsupported),
        (_, VariantType::UInt) => to_uint(value).map(Variant::UInt).ok_or_else(unsupported),
        (_, VariantType::Double) => to_double(value).map(Variant::Double).ok_or_else(unsupported),
        _ => Err(unsupported()),
    }
}

fn to_bool(value: &Variant) -> Option<bool> {
    match value {
        Variant::Int(i) => Some(*i != 0),
        Variant::UInt(u) => Some(*u != 0),
        Variant::Double(d) => Some(*d != 0.0),
        Variant::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_int(value: &Variant) -> Option<i64> {
    match value {
        Variant::Bool(b) => Some(i64::from(*b)),
        Variant::UInt(u) => i64::try_from(*u).ok(),
        Variant::Double(d) => rounded(*d, i64::MIN as f64, i64::MAX as f64).map(|r| r as i64),
        Variant::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_uint(value: &Variant) -> Option<u64> {
    match value {
        Variant::Bool(b) => Some(u64::from(*b)),
        Variant::Int(i) => u64::try_from(*i).ok(),
        Variant::Double(d) => rounded(*d, 0.0, u64::MAX as f64).map(|r| r as u64),
        Variant::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_double(value: &Variant) -> Option<f64> {
    match value {
        Variant::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Variant::Int(i) => Some(*i as f64),
        Variant::UInt(u) => Some(*u as f64),
        Variant::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Round half away from zero, rejecting values outside `[min, max)`.
fn rounded(d: f64, min: f64, max: f64) -> Option<f64> {
    let r = d.round();
    (r.is_finite() && r >= min && r < max).then_some(r)
}

fn convert_container(value: &Variant, target: VariantType) -> Option<Variant> {
    let view = ContainerRef::new(value)?;
    let converted = match target {
        VariantType::List => {
            Variant::List(Arc::new(view.entries().into_iter().map(|(_, v)| v.clone()).collect()))
        }
        VariantType::OrderedMap => Variant::OrderedMap(Arc::new(
            view.entries()
                .into_iter()
                .map(|(key, v)| (key_name(&key), v.clone()))
                .collect::<OrderedMap>(),
        )),
        VariantType::UnorderedMap => Variant::UnorderedMap(Arc::new(
            view.entries()
                .into_iter()
                .map(|(key, v)| (key_name(&key), v.clone()))
                .collect::<UnorderedMap>(),
        )),
        _ => return None,
    };
    Some(converted)
}

fn key_name(key: &Key) -> String {
    match key {
        Key::Index(i) => i.to_string(),
        Key::Name(name) => name.clone(),
    }
}
