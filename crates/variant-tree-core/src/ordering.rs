//! A total order over variants, used to sort sibling keys.
//!
//! - Same type: natural order. Strings compare by length first, then by code
//!   points. `false < true`. Doubles use IEEE total ordering.
//! - Numbers of different types compare by exact numeric value, with the
//!   type rank breaking ties so the order stays antisymmetric.
//! - Everything else compares by type rank, then by canonical text.

use std::cmp::Ordering;

use crate::address::Key;
use crate::value::Variant;

/// Compare two variants.
pub fn compare(a: &Variant, b: &Variant) -> Ordering {
    use Variant::*;

    match (a, b) {
        (Invalid, Invalid) => Ordering::Equal,
        (Bool(x), Bool(y)) => x.cmp(y),
        (Int(x), Int(y)) => x.cmp(y),
        (UInt(x), UInt(y)) => x.cmp(y),
        (Double(x), Double(y)) => x.total_cmp(y),
        (String(x), String(y)) => compare_strings(x, y),
        _ if a.type_tag().is_numeric() && b.type_tag().is_numeric() => {
            compare_numbers(a, b).then_with(|| a.type_tag().rank().cmp(&b.type_tag().rank()))
        }
        _ => a
            .type_tag()
            .rank()
            .cmp(&b.type_tag().rank())
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Compare two sibling keys.
pub fn compare_keys(a: &Key, b: &Key) -> Ordering {
    match (a, b) {
        (Key::Index(x), Key::Index(y)) => x.cmp(y),
        (Key::Name(x), Key::Name(y)) => compare_strings(x, y),
        _ => compare(&a.to_variant(), &b.to_variant()),
    }
}

/// Length first, then code point order.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.cmp(b))
}

fn compare_numbers(a: &Variant, b: &Variant) -> Ordering {
    match (integer_value(a), integer_value(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(x), None) => compare_integer_double(x, b.as_f64().unwrap_or_default()),
        (None, Some(y)) => compare_integer_double(y, a.as_f64().unwrap_or_default()).reverse(),
        (None, None) => a
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&b.as_f64().unwrap_or_default()),
    }
}

fn integer_value(value: &Variant) -> Option<i128> {
    match value {
        Variant::Int(i) => Some(i128::from(*i)),
        Variant::UInt(u) => Some(i128::from(*u)),
        _ => None,
    }
}

/// Exact comparison of an integer with a double. NaN sorts above every number.
fn compare_integer_double(i: i128, d: f64) -> Ordering {
    const LIMIT: f64 = 1.7014118346046923e38; // 2^127

    if d.is_nan() || d >= LIMIT {
        return Ordering::Less;
    }
    if d < -LIMIT {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal if d > whole => Ordering::Less,
        Ordering::Equal if d < whole => Ordering::Greater,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_length_first() {
        assert_eq!(compare_strings("b", "aa"), Ordering::Less);
        assert_eq!(compare_strings("ab", "aa"), Ordering::Greater);
        assert_eq!(compare_strings("é", "ab"), Ordering::Less);
        assert_eq!(compare_strings("x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_doubles_compare_directly() {
        let a = Variant::from(1.25);
        let b = Variant::from(1.75);
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_cross_numeric() {
        assert_eq!(compare(&Variant::Int(-1), &Variant::UInt(0)), Ordering::Less);
        assert_eq!(compare(&Variant::UInt(u64::MAX), &Variant::Int(i64::MAX)), Ordering::Greater);
        assert_eq!(compare(&Variant::Int(2), &Variant::Double(2.5)), Ordering::Less);
        assert_eq!(compare(&Variant::Double(-2.5), &Variant::Int(-2)), Ordering::Less);
        assert_eq!(compare(&Variant::Int(3), &Variant::Double(f64::NAN)), Ordering::Less);
        // Equal magnitude falls back to type rank.
        assert_eq!(compare(&Variant::Int(1), &Variant::Double(1.0)), Ordering::Less);
        assert_eq!(compare(&Variant::Double(1.0), &Variant::Int(1)), Ordering::Greater);
    }

    #[test]
    fn test_unrelated_types_use_rank() {
        assert_eq!(compare(&Variant::Bool(true), &Variant::Int(0)), Ordering::Less);
        assert_eq!(compare(&Variant::from("z"), &Variant::list([1])), Ordering::Less);
        assert_eq!(compare(&Variant::Invalid, &Variant::Bool(false)), Ordering::Less);
    }

    #[test]
    fn test_order_is_consistent() {
        let values = vec![
            Variant::from("bb"),
            Variant::Int(4),
            Variant::Double(-0.5),
            Variant::UInt(3),
            Variant::Bool(true),
            Variant::from("a"),
            Variant::Invalid,
            Variant::list([1, 2]),
        ];
        for a in &values {
            for b in &values {
                assert_eq!(compare(a, b), compare(b, a).reverse());
            }
        }
        let mut sorted = values.clone();
        sorted.sort_by(compare);
        let mut again = sorted.clone();
        again.sort_by(compare);
        assert_eq!(sorted, again);
    }

    #[test]
    fn test_key_order() {
        let mut keys = vec![Key::from("ccc"), Key::from("b"), Key::from(2), Key::from("aa")];
        keys.sort_by(compare_keys);
        assert_eq!(keys, vec![Key::from(2), Key::from("b"), Key::from("aa"), Key::from("ccc")]);
    }
}
