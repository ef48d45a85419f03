//! Stored record to sections.

use crate::model::block::Block;
use crate::model::record::{EnvelopeShape, StoredRecord};
use crate::model::section::{new_section_id, Attachment, Section};
use crate::normalize::document::{normalize_document_with, NormalizedDocument};
use crate::normalize::limits::{NormalizeLimits, Truncation};
use crate::sections::envelope::{recognize, DocumentEnvelope};
use chrono::Local;
use log::debug;
use serde_json::{Map, Value};

/// Inputs that do not come from the record itself.
#[derive(Debug, Clone, Default)]
pub struct ExtractContext {
    /// Date for sections when the record has no reference date; today when
    /// unset.
    pub fallback_date: Option<String>,
    /// Applied to each section's block tree separately.
    pub limits: NormalizeLimits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Never empty.
    pub sections: Vec<Section>,
    /// Recognized shape, `None` when the default empty section was used.
    pub shape: Option<EnvelopeShape>,
    pub truncation: Truncation,
}

/// Extracts sections with default context (no limits, today as fallback).
pub fn to_sections(record: &StoredRecord) -> Vec<Section> {
    extract_sections(record, &ExtractContext::default()).sections
}

/// Extracts the editable sections of a stored record.
///
/// Never fails: unrecognized or undecodable content yields one empty section.
pub fn extract_sections(record: &StoredRecord, context: &ExtractContext) -> Extraction {
    let base_date = resolve_date(record, context);
    let mut extractor = Extractor {
        record,
        base_date,
        limits: context.limits,
        truncation: Truncation::default(),
    };

    let envelope = recognize(&record.content_json, record.content_shape);
    let shape = envelope.as_ref().map(DocumentEnvelope::shape);
    let mut sections = match envelope {
        Some(envelope) => extractor.sections_from(envelope),
        None => Vec::new(),
    };
    if sections.is_empty() {
        sections.push(Section::empty(extractor.base_date.clone()));
    }

    debug!(
        "event=sections_extract module=sections status=ok record_id={} shape={} sections={}",
        record.id,
        shape.map_or("default", EnvelopeShape::as_str),
        sections.len()
    );
    Extraction {
        sections,
        shape,
        truncation: extractor.truncation,
    }
}

fn resolve_date(record: &StoredRecord, context: &ExtractContext) -> String {
    record
        .reference_date
        .clone()
        .or_else(|| context.fallback_date.clone())
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string())
}

struct Extractor<'a> {
    record: &'a StoredRecord,
    base_date: String,
    limits: NormalizeLimits,
    truncation: Truncation,
}

impl Extractor<'_> {
    fn sections_from(&mut self, envelope: DocumentEnvelope) -> Vec<Section> {
        match envelope {
            DocumentEnvelope::BareBlocks(blocks) => vec![self.bare_section(blocks)],
            DocumentEnvelope::SectionList(sections) | DocumentEnvelope::SectionsWrapper(sections) => {
                sections
                    .iter()
                    .map(|section| match section.as_object() {
                        Some(section) => self.object_section(section),
                        None => Section::empty(self.base_date.clone()),
                    })
                    .collect()
            }
            DocumentEnvelope::SingleSection(section) => vec![self.object_section(&section)],
            DocumentEnvelope::EncodedString(inner) => self.sections_from(*inner),
        }
    }

    fn normalize(&mut self, blocks: &Value) -> Vec<Block> {
        let NormalizedDocument { blocks, truncation } = normalize_document_with(blocks, self.limits);
        self.truncation.absorb(truncation);
        blocks
    }

    fn bare_section(&mut self, blocks: Vec<Value>) -> Section {
        let mut blocks = self.normalize(&Value::Array(blocks));
        let title_block = match blocks.first() {
            Some(first) if first.is_heading() => Some(blocks.remove(0)),
            _ => None,
        };
        let title = title_block
            .as_ref()
            .map(|heading| heading.inline_text().trim().to_string())
            .unwrap_or_default();
        if blocks.is_empty() {
            blocks.push(Block::blank_paragraph());
        }

        Section {
            id: new_section_id(),
            date: self.base_date.clone(),
            title,
            blocks,
            text: self.record.content_text.clone(),
            attachments: self.record.attachments.clone(),
            title_block,
        }
    }

    fn object_section(&mut self, section: &Map<String, Value>) -> Section {
        let blocks = self.normalize(section.get("blocks").unwrap_or(&Value::Null));
        Section {
            id: non_empty_string(section, "id").unwrap_or_else(new_section_id),
            date: non_empty_string(section, "date").unwrap_or_else(|| self.base_date.clone()),
            title: string_field(section, "title"),
            blocks,
            text: string_field(section, "text"),
            attachments: section
                .get("attachments")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Attachment::from_value).collect())
                .unwrap_or_default(),
            title_block: None,
        }
    }
}

fn string_field(section: &Map<String, Value>, key: &str) -> String {
    section
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_empty_string(section: &Map<String, Value>, key: &str) -> Option<String> {
    section
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}
