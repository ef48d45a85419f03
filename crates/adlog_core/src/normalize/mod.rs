//! Total normalizers from arbitrary JSON to the canonical model.
//!
//! # Responsibility
//! - Canonicalize inline runs, tables, blocks and whole documents.
//! - Repair malformed input with documented defaults instead of failing.
//!
//! # Invariants
//! - Every function here is total over `serde_json::Value` and never panics.
//! - `normalize_document(normalize_document(x)) == normalize_document(x)`.
//! - A `null` prop is the JSON encoding of a not-a-number value and is dropped.

pub mod block;
pub mod document;
pub mod inline;
pub mod limits;
pub mod table;

use serde_json::{Map, Value};

/// Reads a finite number from a JSON number or numeric string.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Reads an integer >= 1, truncating fractional input.
pub(crate) fn coerce_positive_int(value: &Value) -> Option<u32> {
    let truncated = coerce_f64(value)?.trunc();
    if truncated < 1.0 || truncated > f64::from(u32::MAX) {
        return None;
    }
    Some(truncated as u32)
}

/// Drops every not-a-number entry from a prop map.
pub(crate) fn scrub_not_a_number(props: &mut Map<String, Value>) {
    props.retain(|_, value| !value.is_null());
}

/// Takes `key` out of `map` as an object, or returns an empty one.
pub(crate) fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}
