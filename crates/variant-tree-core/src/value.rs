//! Dynamically-typed values.
//!
//! A [`Variant`] is either an atomic datum (invalid, boolean, integer,
//! unsigned integer, double, string) or a container of further variants
//! (list, insertion-ordered map, unordered map).
//!
//! Containers hold their payload behind an [`Arc`], so cloning a variant is
//! cheap and every write goes through [`Arc::make_mut`]: a container that is
//! still referenced by a snapshot is copied before it is modified, and the
//! snapshot never observes the write.
//!
//! ```
//! use variant_tree_core::Variant;
//!
//! let value = Variant::list([
//!     Variant::from(5),
//!     Variant::from("x"),
//!     Variant::ordered_map([("a", Variant::from(-1)), ("b", Variant::from(true))]),
//! ]);
//!
//! assert!(value.is_container());
//! assert_eq!(value.display_text(1), r#"[5, "x", {2}]"#);
//! assert_eq!(value.display_text(2), r#"[5, "x", {"a": -1, "b": true}]"#);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Insertion-ordered, string-keyed map payload.
pub type OrderedMap = IndexMap<String, Variant>;

/// Unordered, string-keyed map payload.
pub type UnorderedMap = HashMap<String, Variant>;

/// A dynamically-typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    /// No value.
    #[default]
    Invalid,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    List(Arc<Vec<Variant>>),
    OrderedMap(Arc<OrderedMap>),
    UnorderedMap(Arc<UnorderedMap>),
}

/// The type tag of a [`Variant`].
///
/// The declaration order is the rank used when ordering values of
/// unrelated types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantType {
    Invalid,
    Bool,
    Int,
    UInt,
    Double,
    String,
    List,
    OrderedMap,
    UnorderedMap,
}

impl VariantType {
    /// Every type, in rank order.
    pub const ALL: [VariantType; 9] = [
        VariantType::Invalid,
        VariantType::Bool,
        VariantType::Int,
        VariantType::UInt,
        VariantType::Double,
        VariantType::String,
        VariantType::List,
        VariantType::OrderedMap,
        VariantType::UnorderedMap,
    ];

    /// Canonical name shown in the type column.
    pub fn name(self) -> &'static str {
        match self {
            VariantType::Invalid => "Invalid",
            VariantType::Bool => "Boolean",
            VariantType::Int => "Integer",
            VariantType::UInt => "Unsigned integer",
            VariantType::Double => "Double",
            VariantType::String => "String",
            VariantType::List => "List",
            VariantType::OrderedMap => "Map",
            VariantType::UnorderedMap => "Hash",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            VariantType::Invalid => "invalid",
            VariantType::Bool => "bool",
            VariantType::Int => "int",
            VariantType::UInt => "uint",
            VariantType::Double => "double",
            VariantType::String => "string",
            VariantType::List => "list",
            VariantType::OrderedMap => "map",
            VariantType::UnorderedMap => "hash",
        }
    }

    /// Rank used for cross-type ordering.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Whether values of this type hold children.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            VariantType::List | VariantType::OrderedMap | VariantType::UnorderedMap
        )
    }

    /// Whether this is one of the numeric types.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            VariantType::Int | VariantType::UInt | VariantType::Double
        )
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VariantType {
    type Err = TreeError;

    /// Parse a canonical name or short alias, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        VariantType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(wanted) || ty.alias().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TreeError::UnknownType(s.to_string()))
    }
}

impl Variant {
    /// Build a list from values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Variant>,
    {
        Variant::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an insertion-ordered map from key/value pairs.
    pub fn ordered_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Variant>,
    {
        Variant::OrderedMap(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build an unordered map from key/value pairs.
    pub fn unordered_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Variant>,
    {
        Variant::UnorderedMap(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// The default value of a type: zero, empty string or empty container.
    pub fn default_for(ty: VariantType) -> Self {
        match ty {
            VariantType::Invalid => Variant::Invalid,
            VariantType::Bool => Variant::Bool(false),
            VariantType::Int => Variant::Int(0),
            VariantType::UInt => Variant::UInt(0),
            VariantType::Double => Variant::Double(0.0),
            VariantType::String => Variant::String(String::new()),
            VariantType::List => Variant::List(Arc::default()),
            VariantType::OrderedMap => Variant::OrderedMap(Arc::default()),
            VariantType::UnorderedMap => Variant::UnorderedMap(Arc::default()),
        }
    }

    /// The type tag of this value.
    pub fn type_tag(&self) -> VariantType {
        match self {
            Variant::Invalid => VariantType::Invalid,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::UInt(_) => VariantType::UInt,
            Variant::Double(_) => VariantType::Double,
            Variant::String(_) => VariantType::String,
            Variant::List(_) => VariantType::List,
            Variant::OrderedMap(_) => VariantType::OrderedMap,
            Variant::UnorderedMap(_) => VariantType::UnorderedMap,
        }
    }

    /// Whether this value is anything but [`Variant::Invalid`].
    pub fn is_valid(&self) -> bool {
        !matches!(self, Variant::Invalid)
    }

    /// Whether this value holds children.
    pub fn is_container(&self) -> bool {
        self.type_tag().is_container()
    }

    /// Whether this value is atomic (not a container).
    pub fn is_atomic(&self) -> bool {
        !self.is_container()
    }

    /// Number of children, or `None` for atomic values.
    pub fn container_len(&self) -> Option<usize> {
        match self {
            Variant::List(items) => Some(items.len()),
            Variant::OrderedMap(map) => Some(map.len()),
            Variant::UnorderedMap(map) => Some(map.len()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Variant::UInt(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Variant]> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value for display.
    ///
    /// Containers are expanded `depth` levels deep; past that they render as
    /// `[N]` or `{N}` with their child count.
    pub fn display_text(&self, depth: usize) -> String {
        let mut out = String::new();
        self.write_display(&mut out, depth);
        out
    }

    fn write_display(&self, out: &mut String, depth: usize) {
        match self {
            Variant::Invalid => out.push_str("<Invalid>"),
            Variant::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Variant::Int(i) => out.push_str(&i.to_string()),
            Variant::UInt(u) => out.push_str(&u.to_string()),
            Variant::Double(d) => out.push_str(&format_double(*d)),
            Variant::String(s) => {
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
            Variant::List(items) => {
                if depth == 0 {
                    out.push_str(&format!("[{}]", items.len()));
                    return;
                }
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_display(out, depth - 1);
                }
                out.push(']');
            }
            Variant::OrderedMap(map) => {
                write_map(out, map.len(), map.iter(), depth);
            }
            Variant::UnorderedMap(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                write_map(out, map.len(), entries.into_iter(), depth);
            }
        }
    }

    /// Text of an atomic value without string quoting, used by conversions.
    pub(crate) fn plain_text(&self) -> String {
        match self {
            Variant::String(s) => s.clone(),
            other => other.display_text(0),
        }
    }
}

fn write_map<'a>(
    out: &mut String,
    len: usize,
    entries: impl Iterator<Item = (&'a String, &'a Variant)>,
    depth: usize,
) {
    if depth == 0 {
        out.push_str(&format!("{{{}}}", len));
        return;
    }
    out.push('{');
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('"');
        out.push_str(key);
        out.push_str("\": ");
        value.write_display(out, depth - 1);
    }
    out.push('}');
}

/// Shortest round-trip form, with `.0` appended to integral values.
pub(crate) fn format_double(d: f64) -> String {
    let text = d.to_string();
    if d.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text(usize::MAX))
    }
}

impl From<bool> for Variant {
    fn from(b: bool) -> Self {
        Variant::Bool(b)
    }
}

impl From<i32> for Variant {
    fn from(i: i32) -> Self {
        Variant::Int(i64::from(i))
    }
}

impl From<i64> for Variant {
    fn from(i: i64) -> Self {
        Variant::Int(i)
    }
}

impl From<u32> for Variant {
    fn from(u: u32) -> Self {
        Variant::UInt(u64::from(u))
    }
}

impl From<u64> for Variant {
    fn from(u: u64) -> Self {
        Variant::UInt(u)
    }
}

impl From<f64> for Variant {
    fn from(d: f64) -> Self {
        Variant::Double(d)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::String(s.to_string())
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::String(s)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(items: Vec<Variant>) -> Self {
        Variant::List(Arc::new(items))
    }
}

impl From<OrderedMap> for Variant {
    fn from(map: OrderedMap) -> Self {
        Variant::OrderedMap(Arc::new(map))
    }
}

impl From<UnorderedMap> for Variant {
    fn from(map: UnorderedMap) -> Self {
        Variant::UnorderedMap(Arc::new(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        assert_eq!(Variant::default().type_tag(), VariantType::Invalid);
        assert_eq!(Variant::from(1u64).type_tag(), VariantType::UInt);
        assert!(Variant::list(Vec::<Variant>::new()).is_container());
        assert!(Variant::from("s").is_atomic());
        assert!(!Variant::Invalid.is_valid());
    }

    #[test]
    fn test_type_names_parse() {
        for ty in VariantType::ALL {
            assert_eq!(ty.name().parse::<VariantType>().unwrap(), ty);
        }
        assert_eq!("unsigned INTEGER".parse::<VariantType>().unwrap(), VariantType::UInt);
        assert_eq!("hash".parse::<VariantType>().unwrap(), VariantType::UnorderedMap);
        assert!(matches!(
            "matrix".parse::<VariantType>(),
            Err(TreeError::UnknownType(_))
        ));
    }

    #[test]
    fn test_atomic_display() {
        assert_eq!(Variant::Invalid.display_text(1), "<Invalid>");
        assert_eq!(Variant::from(false).display_text(1), "false");
        assert_eq!(Variant::from(-12).display_text(1), "-12");
        assert_eq!(Variant::from(3.0).display_text(1), "3.0");
        assert_eq!(Variant::from(0.25).display_text(1), "0.25");
        assert_eq!(Variant::from("hi").display_text(1), "\"hi\"");
    }

    #[test]
    fn test_container_display_depth() {
        let value = Variant::list([Variant::from(1), Variant::list([Variant::from(2)])]);
        assert_eq!(value.display_text(0), "[2]");
        assert_eq!(value.display_text(1), "[1, [1]]");
        assert_eq!(value.display_text(2), "[1, [2]]");

        let hash = Variant::unordered_map([("z", 1), ("a", 2)]);
        assert_eq!(hash.display_text(1), "{\"a\": 2, \"z\": 1}");
        assert_eq!(hash.display_text(0), "{2}");
    }

    #[test]
    fn test_clone_shares_payload() {
        let value = Variant::list([1, 2, 3]);
        let copy = value.clone();
        match (&value, &copy) {
            (Variant::List(a), Variant::List(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }
}
