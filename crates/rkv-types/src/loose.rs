//! Loose comparison of dynamically typed values.
//!
//! Map/reduce payloads are untyped JSON, and Riak's query phases were written
//! against script-language comparison rules. These helpers reproduce them:
//!
//! - two strings compare lexicographically;
//! - any other pair is converted to numbers and compared numerically;
//! - arrays and objects first collapse to their string form;
//! - a comparison involving `NaN` is unordered.

use std::cmp::Ordering;

use serde_json::Value;

/// A value reduced to a primitive for comparison.
enum Primitive {
    Number(f64),
    Text(String),
}

fn to_primitive(value: &Value) -> Primitive {
    match value {
        Value::String(s) => Primitive::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => Primitive::Text(to_display_string(value)),
        other => Primitive::Number(to_number(other)),
    }
}

/// Convert a string to a number. Blank strings are zero; anything that is
/// not a plain decimal literal is `NaN`.
pub fn str_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let plain = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !plain {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Numeric conversion of an arbitrary value.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => str_to_number(s),
        Value::Array(_) => str_to_number(&to_display_string(value)),
        Value::Object(_) => f64::NAN,
    }
}

/// The string form of a value, as used by default sorting and string
/// coercion.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (_, Some(u)) => u.to_string(),
            _ => format_float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

/// Relational comparison. `None` means the values are unordered, in which
/// case every relational operator evaluates to false.
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (to_primitive(a), to_primitive(b)) {
        (Primitive::Text(x), Primitive::Text(y)) => Some(x.cmp(&y)),
        (Primitive::Number(x), Primitive::Number(y)) => x.partial_cmp(&y),
        (Primitive::Number(x), Primitive::Text(y)) => x.partial_cmp(&str_to_number(&y)),
        (Primitive::Text(x), Primitive::Number(y)) => str_to_number(&x).partial_cmp(&y),
    }
}

/// `a < b`
pub fn loose_lt(a: &Value, b: &Value) -> bool {
    loose_cmp(a, b) == Some(Ordering::Less)
}

/// `a > b`
pub fn loose_gt(a: &Value, b: &Value) -> bool {
    loose_cmp(a, b) == Some(Ordering::Greater)
}

/// `a <= b`
pub fn loose_le(a: &Value, b: &Value) -> bool {
    matches!(loose_cmp(a, b), Some(Ordering::Less | Ordering::Equal))
}

/// `a >= b`
pub fn loose_ge(a: &Value, b: &Value) -> bool {
    matches!(loose_cmp(a, b), Some(Ordering::Greater | Ordering::Equal))
}

/// Loose equality.
///
/// Null only equals null. Values of the same JSON type compare
/// structurally; mixed types are coerced as for [`loose_cmp`].
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(_), Value::String(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Object(_), Value::Object(_)) => a == b,
        _ => loose_cmp(a, b) == Some(Ordering::Equal),
    }
}
