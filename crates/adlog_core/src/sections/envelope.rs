//! Recognition of the shapes `content_json` has been stored in.
//!
//! Each shape has one recognizer. Recognizers run in priority order and the
//! first match wins; a `content_shape` hint written by a newer writer is tried
//! before the cascade.

use crate::model::record::EnvelopeShape;
use log::warn;
use serde_json::{Map, Value};

/// Recognized `content_json` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEnvelope {
    /// Block sequence of one section, optionally led by a title heading.
    BareBlocks(Vec<Value>),
    /// Sequence of section objects without a wrapper.
    SectionList(Vec<Value>),
    /// `{ "sections": [...] }`.
    SectionsWrapper(Vec<Value>),
    /// `{ "blocks": [...], ... }`.
    SingleSection(Map<String, Value>),
    /// JSON text of one of the other shapes.
    EncodedString(Box<DocumentEnvelope>),
}

impl DocumentEnvelope {
    pub fn shape(&self) -> EnvelopeShape {
        match self {
            Self::BareBlocks(_) => EnvelopeShape::Blocks,
            Self::SectionList(_) => EnvelopeShape::SectionList,
            Self::SectionsWrapper(_) => EnvelopeShape::Sections,
            Self::SingleSection(_) => EnvelopeShape::SingleSection,
            Self::EncodedString(_) => EnvelopeShape::EncodedJson,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EnvelopeRecognizer {
    shape: EnvelopeShape,
    recognize: fn(&Value) -> Option<DocumentEnvelope>,
}

const RECOGNIZERS: &[EnvelopeRecognizer] = &[
    EnvelopeRecognizer {
        shape: EnvelopeShape::SectionList,
        recognize: recognize_section_list,
    },
    EnvelopeRecognizer {
        shape: EnvelopeShape::Blocks,
        recognize: recognize_bare_blocks,
    },
    EnvelopeRecognizer {
        shape: EnvelopeShape::Sections,
        recognize: recognize_sections_wrapper,
    },
    EnvelopeRecognizer {
        shape: EnvelopeShape::SingleSection,
        recognize: recognize_single_section,
    },
    EnvelopeRecognizer {
        shape: EnvelopeShape::EncodedJson,
        recognize: recognize_encoded,
    },
];

/// Classifies a stored `content_json` value.
///
/// Returns `None` for values no recognizer accepts (null, numbers, undecodable
/// strings); callers fall back to an empty document.
pub fn recognize(content: &Value, hint: Option<EnvelopeShape>) -> Option<DocumentEnvelope> {
    let hinted = hint.and_then(|shape| RECOGNIZERS.iter().find(|entry| entry.shape == shape));
    if let Some(envelope) = hinted.and_then(|entry| (entry.recognize)(content)) {
        return Some(envelope);
    }

    RECOGNIZERS
        .iter()
        .filter(|entry| Some(entry.shape) != hint)
        .find_map(|entry| (entry.recognize)(content))
}

// Decoded text is matched against every shape except another encoded string,
// so decoding happens at most once.
fn recognize_decoded(content: &Value) -> Option<DocumentEnvelope> {
    RECOGNIZERS
        .iter()
        .filter(|entry| entry.shape != EnvelopeShape::EncodedJson)
        .find_map(|entry| (entry.recognize)(content))
}

fn recognize_section_list(content: &Value) -> Option<DocumentEnvelope> {
    let items = content.as_array()?;
    if items.is_empty() || !items.iter().all(is_section_object) {
        return None;
    }
    Some(DocumentEnvelope::SectionList(items.clone()))
}

fn recognize_bare_blocks(content: &Value) -> Option<DocumentEnvelope> {
    content
        .as_array()
        .map(|items| DocumentEnvelope::BareBlocks(items.clone()))
}

fn recognize_sections_wrapper(content: &Value) -> Option<DocumentEnvelope> {
    content
        .get("sections")
        .and_then(Value::as_array)
        .map(|sections| DocumentEnvelope::SectionsWrapper(sections.clone()))
}

fn recognize_single_section(content: &Value) -> Option<DocumentEnvelope> {
    is_section_object(content)
        .then(|| content.as_object().cloned())
        .flatten()
        .map(DocumentEnvelope::SingleSection)
}

fn recognize_encoded(content: &Value) -> Option<DocumentEnvelope> {
    let text = content.as_str()?;
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(decoded) => {
            recognize_decoded(&decoded).map(|inner| DocumentEnvelope::EncodedString(Box::new(inner)))
        }
        Err(err) => {
            warn!(
                "event=envelope_decode module=sections status=error error_code=content_json_decode_failed error={err}"
            );
            None
        }
    }
}

// A section object carries a `blocks` sequence and is not itself a block.
fn is_section_object(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    map.get("blocks").is_some_and(Value::is_array)
        && !map.contains_key("type")
        && !map.contains_key("name")
}
