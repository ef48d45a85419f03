//! Inline content model.
//!
//! # Responsibility
//! - Define the smallest content unit (`InlineRun`) of the block tree.
//! - Keep non-text inline items (links, mentions) as opaque JSON.
//!
//! # Invariants
//! - An `InlineRun` always serializes with `type`, `text` and `styles`.
//! - Opaque items serialize back to exactly the JSON they were read from.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const RUN_KEYS: &[&str] = &["type", "text", "styles"];

/// Serialized as the `"text"` kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InlineTag {
    #[serde(rename = "text")]
    Text,
}

/// One style attribute value: a toggle (`bold: true`) or a value
/// (`textColor: "red"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StyleValue {
    Flag(bool),
    Value(String),
}

/// A run of uniformly styled text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineRun {
    #[serde(rename = "type")]
    pub tag: InlineTag,
    pub text: String,
    pub styles: BTreeMap<String, StyleValue>,
}

impl InlineRun {
    /// Creates an unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            tag: InlineTag::Text,
            text: text.into(),
            styles: BTreeMap::new(),
        }
    }

    /// Recognizes a JSON object that is exactly a text run.
    ///
    /// Returns `None` for anything carrying keys or value types a run cannot
    /// represent, so the caller can keep it opaque instead of losing data.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.get("type").and_then(Value::as_str) != Some("text") {
            return None;
        }
        if map.keys().any(|key| !RUN_KEYS.contains(&key.as_str())) {
            return None;
        }
        let text = map.get("text")?.as_str()?;
        let styles = match map.get("styles") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(raw)) => parse_styles(raw)?,
            Some(_) => return None,
        };

        Some(Self {
            tag: InlineTag::Text,
            text: text.to_string(),
            styles,
        })
    }
}

fn parse_styles(raw: &Map<String, Value>) -> Option<BTreeMap<String, StyleValue>> {
    let mut styles = BTreeMap::new();
    for (key, value) in raw {
        let style = match value {
            Value::Bool(flag) => StyleValue::Flag(*flag),
            Value::String(text) => StyleValue::Value(text.clone()),
            _ => return None,
        };
        styles.insert(key.clone(), style);
    }
    Some(styles)
}

/// One element of an inline sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Inline {
    Text(InlineRun),
    /// Inline item whose schema belongs to the editor (link, mention, ...).
    Opaque(Value),
}

impl Inline {
    /// Classifies one element without altering opaque data.
    pub fn from_value(value: &Value) -> Self {
        match InlineRun::from_value(value) {
            Some(run) => Self::Text(run),
            None => Self::Opaque(value.clone()),
        }
    }

    /// Appends the visible text of this item to `out`.
    pub fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(run) => out.push_str(&run.text),
            Self::Opaque(value) => push_value_text(value, out),
        }
    }
}

/// Concatenates the visible text of an inline sequence.
pub fn inline_text(items: &[Inline]) -> String {
    let mut out = String::new();
    for item in items {
        item.push_text(&mut out);
    }
    out
}

// Links carry their label as nested runs under `content`.
fn push_value_text(value: &Value, out: &mut String) {
    match value {
        Value::String(text) => out.push_str(text),
        Value::Array(items) => items.iter().for_each(|item| push_value_text(item, out)),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
            if let Some(content) = map.get("content") {
                if !content.is_string() {
                    push_value_text(content, out);
                }
            }
        }
        _ => {}
    }
}
