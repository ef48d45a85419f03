//! Stored record model.
//!
//! # Responsibility
//! - Read the engine-relevant fields out of a raw persisted record.
//! - Name the record fields and content shapes shared by read and write paths.
//!
//! # Invariants
//! - Reading a record never fails; unusable fields fall back to empty values.
//! - Fields not listed here are never touched by the engine.

use crate::model::section::Attachment;
use serde_json::Value;

pub const FIELD_RECORD_ID: &str = "log_id";
pub const FIELD_REFERENCE_DATE: &str = "month_date";
pub const FIELD_CONTENT_JSON: &str = "content_json";
pub const FIELD_CONTENT_TEXT: &str = "content_text";
pub const FIELD_ATTACHMENTS: &str = "attachments";
pub const FIELD_CONTENT_SHAPE: &str = "content_shape";
pub const FIELD_CONTENT_FORMAT: &str = "content_format";
pub const FIELD_CONTENT_SCHEMA_VERSION: &str = "content_schema_version";
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Editor document format written next to every `content_json`.
pub const CONTENT_FORMAT: &str = "blocknote@0.23";
/// Version of the record layout written by this engine.
pub const CONTENT_SCHEMA_VERSION: u32 = 1;

/// Shape discriminator of a `content_json` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeShape {
    /// Bare canonical block sequence.
    Blocks,
    /// `{ "sections": [...] }` wrapper.
    Sections,
    /// One section object `{ "blocks": [...] }`; read-only legacy shape.
    SingleSection,
    /// Bare sequence of section objects; read-only legacy shape.
    SectionList,
    /// JSON text of one of the shapes above.
    EncodedJson,
}

impl EnvelopeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Sections => "sections",
            Self::SingleSection => "section",
            Self::SectionList => "section_list",
            Self::EncodedJson => "json_string",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "blocks" => Some(Self::Blocks),
            "sections" => Some(Self::Sections),
            "section" => Some(Self::SingleSection),
            "section_list" => Some(Self::SectionList),
            "json_string" => Some(Self::EncodedJson),
            _ => None,
        }
    }
}

/// Engine view of one persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    /// Date new sections default to, `YYYY-MM-DD`.
    pub reference_date: Option<String>,
    /// Raw document payload in any supported shape.
    pub content_json: Value,
    pub content_text: String,
    pub attachments: Vec<Attachment>,
    /// Shape written by the last save, when the writer recorded one.
    pub content_shape: Option<EnvelopeShape>,
}

impl StoredRecord {
    /// Record used when the store has nothing under `id`.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference_date: None,
            content_json: Value::Null,
            content_text: String::new(),
            attachments: Vec::new(),
            content_shape: None,
        }
    }

    /// Reads a raw record as returned by a storage collaborator.
    ///
    /// Non-object records are treated as empty.
    pub fn from_value(id: impl Into<String>, raw: &Value) -> Self {
        let mut record = Self::empty(id);
        let Some(map) = raw.as_object() else {
            return record;
        };

        record.reference_date = map
            .get(FIELD_REFERENCE_DATE)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .map(str::to_string);
        record.content_json = map.get(FIELD_CONTENT_JSON).cloned().unwrap_or(Value::Null);
        record.content_text = map
            .get(FIELD_CONTENT_TEXT)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        record.attachments = map
            .get(FIELD_ATTACHMENTS)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Attachment::from_value).collect())
            .unwrap_or_default();
        record.content_shape = map
            .get(FIELD_CONTENT_SHAPE)
            .and_then(Value::as_str)
            .and_then(EnvelopeShape::parse);
        record
    }
}
