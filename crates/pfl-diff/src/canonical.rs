//! Canonical deep equality over JSON values.
//!
//! Stored state passes through several writers that disagree on how to
//! spell "nothing here": a missing key, an explicit `null`, or an empty
//! array. Canonical equality treats those as the same value so a diff
//! never reports a change the user cannot see.

use serde_json::Value;

/// Returns `true` if the value denotes an empty collection slot:
/// `null` or `[]`. A missing object key compares as `null`.
pub(crate) fn is_empty_marker(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Key-order-insensitive structural equality with two canonicalizations:
/// empty markers (`null`, `[]`, missing) are mutually equal, and numbers
/// compare by value so `1200` equals `1200.0`.
pub fn canonical_eq(a: &Value, b: &Value) -> bool {
    if is_empty_marker(a) && is_empty_marker(b) {
        return true;
    }
    match (a, b) {
        (Value::Object(ao), Value::Object(bo)) => {
            ao.iter()
                .all(|(k, av)| canonical_eq(av, bo.get(k).unwrap_or(&Value::Null)))
                && bo
                    .iter()
                    .all(|(k, bv)| ao.contains_key(k) || is_empty_marker(bv))
        }
        (Value::Array(aa), Value::Array(ba)) => {
            aa.len() == ba.len() && aa.iter().zip(ba.iter()).all(|(x, y)| canonical_eq(x, y))
        }
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
