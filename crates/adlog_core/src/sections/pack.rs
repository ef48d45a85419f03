//! Sections back to storable record payloads.
//!
//! # Invariants
//! - Every variant carries the same sections; only the `content_json`
//!   encoding differs.
//! - Variants are ordered newest reader first; the adapter stops at the first
//!   one the store accepts.

use crate::model::block::{Block, BlockContent, DEFAULT_HEADING_LEVEL};
use crate::model::inline::{Inline, InlineRun};
use crate::model::record::{
    EnvelopeShape, CONTENT_FORMAT, CONTENT_SCHEMA_VERSION, FIELD_ATTACHMENTS, FIELD_CONTENT_FORMAT,
    FIELD_CONTENT_JSON, FIELD_CONTENT_SCHEMA_VERSION, FIELD_CONTENT_SHAPE, FIELD_CONTENT_TEXT,
};
use crate::model::section::{Attachment, Section};
use crate::normalize::document::renormalize_blocks;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Stored form of one section inside the sections wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedSection {
    pub id: String,
    pub date: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub text: String,
    pub attachments: Vec<Attachment>,
    #[serde(skip)]
    pub(crate) title_block: Option<Block>,
}

/// One candidate encoding of `content_json`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedVariant {
    pub shape: EnvelopeShape,
    pub content_json: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackedSections {
    pub sections: Vec<PackedSection>,
    /// Trimmed, non-empty section texts joined by a blank line.
    pub content_text: String,
    /// All section attachments, first occurrence of each identity kept.
    pub attachments: Vec<Attachment>,
    /// Candidate encodings in write priority order.
    pub variants: Vec<EncodedVariant>,
}

impl PackedSections {
    /// Full record patch for one variant.
    pub fn payload(&self, variant: &EncodedVariant) -> serde_json::Result<Value> {
        let mut patch = Map::new();
        patch.insert(FIELD_CONTENT_JSON.to_string(), variant.content_json.clone());
        patch.insert(
            FIELD_CONTENT_TEXT.to_string(),
            Value::from(self.content_text.as_str()),
        );
        patch.insert(
            FIELD_ATTACHMENTS.to_string(),
            serde_json::to_value(&self.attachments)?,
        );
        patch.insert(
            FIELD_CONTENT_SHAPE.to_string(),
            Value::from(variant.shape.as_str()),
        );
        patch.insert(FIELD_CONTENT_FORMAT.to_string(), Value::from(CONTENT_FORMAT));
        patch.insert(
            FIELD_CONTENT_SCHEMA_VERSION.to_string(),
            Value::from(CONTENT_SCHEMA_VERSION),
        );
        Ok(Value::Object(patch))
    }
}

/// Packs edited sections into the ordered write variants.
///
/// The bare block variant is only produced for exactly one section; it cannot
/// represent more without losing section boundaries.
pub fn from_sections(sections: &[Section]) -> serde_json::Result<PackedSections> {
    let packed = sections
        .iter()
        .map(pack_section)
        .collect::<serde_json::Result<Vec<_>>>()?;

    let content_text = packed
        .iter()
        .map(|section| section.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    let attachments = dedup_attachments(packed.iter().flat_map(|section| &section.attachments));

    let mut variants = Vec::with_capacity(3);
    if let [only] = packed.as_slice() {
        variants.push(EncodedVariant {
            shape: EnvelopeShape::Blocks,
            content_json: serde_json::to_value(titled_blocks(only))?,
        });
    }
    let wrapper = json!({ "sections": serde_json::to_value(&packed)? });
    let encoded = serde_json::to_string(&wrapper)?;
    variants.push(EncodedVariant {
        shape: EnvelopeShape::Sections,
        content_json: wrapper,
    });
    variants.push(EncodedVariant {
        shape: EnvelopeShape::EncodedJson,
        content_json: Value::from(encoded),
    });

    Ok(PackedSections {
        sections: packed,
        content_text,
        attachments,
        variants,
    })
}

fn pack_section(section: &Section) -> serde_json::Result<PackedSection> {
    Ok(PackedSection {
        id: section.id.clone(),
        date: section.date.clone(),
        title: section.title.clone(),
        blocks: renormalize_blocks(&section.blocks)?,
        text: section.text.clone(),
        attachments: section.attachments.clone(),
        title_block: section.title_block.clone(),
    })
}

// The title travels as a leading heading. A body that itself starts with a
// heading gets an (empty) title heading too, or it would be read back as the
// title.
fn titled_blocks(section: &PackedSection) -> Vec<Block> {
    let needs_heading =
        !section.title.is_empty() || section.blocks.first().is_some_and(Block::is_heading);
    let mut blocks = Vec::with_capacity(section.blocks.len() + 1);
    if needs_heading {
        blocks.push(title_heading(&section.title, section.title_block.as_ref()));
    }
    blocks.extend(section.blocks.iter().cloned());
    blocks
}

// The heading the title was read from is written back as is while its text
// still matches; a changed title replaces only the text, keeping the first
// run's styles.
fn title_heading(title: &str, read_from: Option<&Block>) -> Block {
    let Some(heading) = read_from else {
        return Block::heading(DEFAULT_HEADING_LEVEL, title);
    };
    if heading.inline_text().trim() == title {
        return heading.clone();
    }

    let mut run = InlineRun::plain(title);
    if let BlockContent::Inline(items) = &heading.content {
        if let Some(styles) = items.iter().find_map(|item| match item {
            Inline::Text(first) => Some(first.styles.clone()),
            Inline::Opaque(_) => None,
        }) {
            run.styles = styles;
        }
    }
    let mut renamed = heading.clone();
    renamed.content = BlockContent::Inline(vec![Inline::Text(run)]);
    renamed
}

fn dedup_attachments<'a>(attachments: impl Iterator<Item = &'a Attachment>) -> Vec<Attachment> {
    let mut seen = HashSet::new();
    attachments
        .filter(|attachment| seen.insert(attachment.dedup_key()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::from_sections;
    use crate::model::block::{Block, BlockContent, DEFAULT_HEADING_LEVEL};
    use crate::normalize::block::normalize_block;
    use crate::model::inline::{Inline, InlineRun};
    use crate::model::record::EnvelopeShape;
    use crate::model::section::{Attachment, Section};
    use serde_json::json;

    fn section(title: &str, text: &str) -> Section {
        let mut section = Section::empty("2025-09-01");
        section.title = title.to_string();
        section.text = text.to_string();
        section
    }

    #[test]
    fn single_section_offers_three_variants_in_order() {
        let packed = from_sections(&[section("T", "body")]).unwrap();
        let shapes: Vec<_> = packed.variants.iter().map(|variant| variant.shape).collect();
        assert_eq!(
            shapes,
            vec![
                EnvelopeShape::Blocks,
                EnvelopeShape::Sections,
                EnvelopeShape::EncodedJson
            ]
        );
        let bare = packed.variants[0].content_json.as_array().unwrap();
        assert_eq!(bare[0]["type"], json!("heading"));
        assert_eq!(bare[0]["content"][0]["text"], json!("T"));
        assert!(packed.variants[2].content_json.is_string());
    }

    #[test]
    fn multiple_sections_skip_the_bare_variant() {
        let packed = from_sections(&[section("A", ""), section("B", "")]).unwrap();
        assert_eq!(packed.variants.len(), 2);
        assert_eq!(packed.variants[0].shape, EnvelopeShape::Sections);
    }

    #[test]
    fn texts_are_trimmed_and_joined() {
        let packed = from_sections(&[section("", "  one "), section("", "   "), section("", "two")])
            .unwrap();
        assert_eq!(packed.content_text, "one\n\ntwo");
    }

    #[test]
    fn untitled_body_starting_with_heading_gets_empty_title_heading() {
        let mut only = section("", "");
        only.blocks = vec![Block::heading(3, "Body heading")];
        let packed = from_sections(&[only]).unwrap();
        let bare = packed.variants[0].content_json.as_array().unwrap();
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[0]["content"][0]["text"], json!(""));
    }

    #[test]
    fn renamed_title_keeps_heading_props_and_styles() {
        let mut only = section("Renamed", "");
        only.title_block = Some(normalize_block(&json!({
            "id": "h1",
            "type": "heading",
            "props": {"level": 1, "textColor": "red"},
            "content": [{"type": "text", "text": "Old", "styles": {"bold": true}}]
        })));
        let packed = from_sections(&[only]).unwrap();
        let heading = &packed.variants[0].content_json[0];
        assert_eq!(heading["id"], json!("h1"));
        assert_eq!(heading["props"]["level"], json!(1));
        assert_eq!(heading["props"]["textColor"], json!("red"));
        assert_eq!(
            heading["content"],
            json!([{"type": "text", "text": "Renamed", "styles": {"bold": true}}])
        );
    }

    #[test]
    fn attachments_dedup_first_occurrence_wins() {
        let mut first = section("", "");
        first.attachments = vec![
            Attachment::from_value(&json!({"url": "u", "name": "first"})).unwrap(),
            Attachment::from_value(&json!({"id": "i"})).unwrap(),
        ];
        let mut second = section("", "");
        second.attachments = vec![
            Attachment::from_value(&json!({"url": "u", "name": "second"})).unwrap(),
            Attachment::from_value(&json!({"id": "i", "kind": "image"})).unwrap(),
        ];
        let packed = from_sections(&[first, second]).unwrap();
        assert_eq!(packed.attachments.len(), 2);
        assert_eq!(packed.attachments[0].name.as_deref(), Some("first"));
        assert_eq!(packed.attachments[1].kind, None);
    }

    #[test]
    fn payload_carries_record_metadata() {
        let packed = from_sections(&[section("T", "body")]).unwrap();
        let payload = packed.payload(&packed.variants[1]).unwrap();
        assert_eq!(payload["content_shape"], json!("sections"));
        assert_eq!(payload["content_format"], json!("blocknote@0.23"));
        assert_eq!(payload["content_schema_version"], json!(1));
        assert_eq!(payload["content_text"], json!("body"));
    }
}
