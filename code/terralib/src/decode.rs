// Best-effort decoding of numeric fields out of a raw JSON document.
//
// The device is not trusted to send well-typed values, so a field that is
// missing or can't be read as a number decodes to a fallback instead of
// failing the whole request. Callers get told about it through `defaulted`.

use crate::types::Document;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Decoded<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

// Accepts JSON numbers, numeric strings (surrounding whitespace allowed) and
// booleans (as 1/0).
pub fn decode_f64(doc: &Document, key: &str, fallback: f64) -> Decoded<f64> {
    match doc.get(key).and_then(value_as_f64) {
        Some(v) => Decoded::ok(v),
        None => Decoded::fallback(fallback),
    }
}

// Like decode_f64, but for integer fields. Floats are truncated toward zero
// and clamped to the i64 range; strings must hold an integer literal.
pub fn decode_i64(doc: &Document, key: &str, fallback: i64) -> Decoded<i64> {
    match doc.get(key).and_then(value_as_i64) {
        Some(v) => Decoded::ok(v),
        None => Decoded::fallback(fallback),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // Out-of-range values saturate at i64::MIN/MAX.
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
