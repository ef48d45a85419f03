//! Inline content normalizer.

use crate::model::inline::{Inline, InlineRun};
use serde_json::Value;

/// Canonicalizes the inline content of a text-bearing block or table cell.
///
/// - `null` yields an empty sequence.
/// - A sequence is kept element for element; items are classified but not
///   validated further.
/// - A string becomes one unstyled run.
/// - A single object tagged `text` is wrapped in a one-element sequence.
/// - Anything else yields an empty sequence.
pub fn normalize_inline(value: &Value) -> Vec<Inline> {
    match value {
        Value::Array(items) => items.iter().map(Inline::from_value).collect(),
        Value::String(text) => vec![Inline::Text(InlineRun::plain(text.as_str()))],
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("text") => {
            vec![Inline::from_value(value)]
        }
        _ => Vec::new(),
    }
}
