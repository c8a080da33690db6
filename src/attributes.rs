//! Open-ended attribute maps carried by every record.

use serde_json::{Map, Value};

/// Caller-defined fields of a record.
///
/// The store never interprets these beyond exact-match search and the
/// analytics fields (`subjects`, `education_level`).
pub type Attributes = Map<String, Value>;

/// Removes `reserved` keys from `attrs`.
pub(crate) fn strip_reserved(attrs: &mut Attributes, reserved: &[&str]) {
    for key in reserved {
        attrs.remove(*key);
    }
}

/// Shallow merge: keys in `patch` override, keys absent from `patch` stay.
pub(crate) fn merge_into(target: &mut Attributes, patch: Attributes, reserved: &[&str]) {
    for (key, value) in patch {
        if reserved.contains(&key.as_str()) {
            continue;
        }
        target.insert(key, value);
    }
}

/// JSON equality with numbers compared by value, so `3` equals `3.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Returns true if `document` holds an equal value for every key of
/// `criteria`. A missing key never matches, not even a `null` criterion.
/// Numbers match by value regardless of integer or float encoding.
#[must_use]
pub fn matches_criteria(document: &Attributes, criteria: &Attributes) -> bool {
    criteria.iter().all(|(key, expected)| {
        document
            .get(key)
            .is_some_and(|actual| values_equal(actual, expected))
    })
}
