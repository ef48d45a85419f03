//! Section and attachment models.
//!
//! # Responsibility
//! - Define the derived title + body view edited by one editor instance.
//! - Define attachment metadata carried next to the document.
//!
//! # Invariants
//! - `Section::blocks` is canonical and non-empty.
//! - A section is recomputed on every load and discarded after save; it is
//!   never the system of record.

use crate::model::block::Block;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque section identifier, unique within one loaded record.
pub type SectionId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: SectionId,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub title: String,
    pub blocks: Vec<Block>,
    /// Plain-text projection used for search.
    pub text: String,
    pub attachments: Vec<Attachment>,
    /// Leading heading the title was read from, re-emitted on bare writes.
    #[serde(skip)]
    pub(crate) title_block: Option<Block>,
}

impl Section {
    /// Creates an empty section with a freshly generated identifier.
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            id: new_section_id(),
            date: date.into(),
            title: String::new(),
            blocks: vec![Block::blank_paragraph()],
            text: String::new(),
            attachments: Vec::new(),
            title_block: None,
        }
    }
}

pub fn new_section_id() -> SectionId {
    Uuid::new_v4().to_string()
}

/// Media or file reference attached to a document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Seconds, for audio/video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Unknown fields and known fields with unexpected types, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attachment {
    /// Reads one stored attachment entry.
    ///
    /// A bare string is taken as a URL. Returns `None` for entries that carry
    /// nothing (null, numbers, booleans).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) => Some(Self {
                url: Some(url.clone()),
                ..Self::default()
            }),
            Value::Object(map) => {
                let mut extra = map.clone();
                let id = take_string(&mut extra, "id");
                let kind = take_string(&mut extra, "kind");
                let url = take_string(&mut extra, "url");
                let name = take_string(&mut extra, "name");
                let width = take_dimension(&mut extra, "width");
                let height = take_dimension(&mut extra, "height");
                let duration = take_duration(&mut extra);
                // `null` is the JSON spelling of an unset optional.
                extra.retain(|_, value| !value.is_null());
                Some(Self {
                    id,
                    kind,
                    url,
                    name,
                    width,
                    height,
                    duration,
                    extra,
                })
            }
            _ => None,
        }
    }

    /// Identity used to deduplicate attachments: URL, then id, then the
    /// canonical JSON text of the whole entry.
    pub fn dedup_key(&self) -> String {
        if let Some(url) = self.url.as_deref().filter(|url| !url.is_empty()) {
            return format!("url:{url}");
        }
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return format!("id:{id}");
        }
        format!("json:{}", serde_json::to_string(self).unwrap_or_default())
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !map.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match map.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

fn take_dimension(map: &mut Map<String, Value>, key: &str) -> Option<u32> {
    let parsed = map
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())?;
    map.remove(key);
    Some(parsed)
}

fn take_duration(map: &mut Map<String, Value>) -> Option<f64> {
    let parsed = map.get("duration").and_then(Value::as_f64)?;
    map.remove("duration");
    Some(parsed)
}
