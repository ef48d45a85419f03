//! Block normalizer.

use crate::model::block::{Block, BlockContent, BlockKind, Props, DEFAULT_HEADING_LEVEL};
use crate::model::inline::Inline;
use crate::model::table::DEFAULT_TEXT_ALIGNMENT;
use crate::normalize::inline::normalize_inline;
use crate::normalize::limits::{Budget, NormalizeLimits};
use crate::normalize::table::normalize_table;
use crate::normalize::{coerce_f64, scrub_not_a_number, take_object};
use serde_json::{Map, Value};

/// Canonicalizes one block and, recursively, all of its children.
///
/// Non-object input becomes a blank paragraph. Nesting is not bounded; use
/// `normalize_document_with` for untrusted input.
pub fn normalize_block(node: &Value) -> Block {
    let mut budget = Budget::new(NormalizeLimits::unbounded());
    normalize_block_at(node, 0, &mut budget)
}

pub(crate) fn normalize_block_at(node: &Value, depth: usize, budget: &mut Budget) -> Block {
    let Value::Object(source) = node else {
        return Block::blank_paragraph();
    };

    // Children are normalized from the source; only this node's own fields
    // are copied.
    let mut fields: Map<String, Value> = source
        .iter()
        .filter(|(key, _)| key.as_str() != "children")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let kind = resolve_kind(&mut fields);
    let mut props = take_object(&mut fields, "props");
    scrub_not_a_number(&mut props);
    let raw_content = fields.remove("content").unwrap_or(Value::Null);

    let content = match &kind {
        BlockKind::Heading => {
            normalize_heading_level(&mut props);
            default_alignment(&mut props);
            BlockContent::Inline(heading_inline(raw_content))
        }
        BlockKind::Paragraph => {
            default_alignment(&mut props);
            BlockContent::Inline(normalize_inline(&raw_content))
        }
        BlockKind::Table => BlockContent::Table(normalize_table(&raw_content)),
        BlockKind::Other(_) => BlockContent::Opaque(match raw_content {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        }),
    };

    let children = normalize_children(
        source.get("children").unwrap_or(&Value::Null),
        depth + 1,
        budget,
    );

    Block {
        kind,
        props,
        content,
        children,
        extra: fields,
    }
}

fn normalize_children(raw: &Value, depth: usize, budget: &mut Budget) -> Vec<Block> {
    let Value::Array(items) = raw else {
        return Vec::new();
    };
    if items.is_empty() || !budget.enter_depth(depth) {
        return Vec::new();
    }

    let mut children = Vec::with_capacity(items.len());
    for item in items {
        if budget.take_block() {
            children.push(normalize_block_at(item, depth, budget));
        }
    }
    children
}

// `type`, then the legacy `name` field, then paragraph.
fn resolve_kind(fields: &mut Map<String, Value>) -> BlockKind {
    let declared = fields.remove("type");
    let raw = non_empty_str(declared.as_ref()).or_else(|| non_empty_str(fields.get("name")));
    raw.map_or(BlockKind::Paragraph, BlockKind::parse)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

// A lone inline object (a link, a mention) is kept rather than dropped.
fn heading_inline(raw: Value) -> Vec<Inline> {
    match raw {
        Value::Object(_) => vec![Inline::from_value(&raw)],
        other => normalize_inline(&other),
    }
}

fn normalize_heading_level(props: &mut Props) {
    let level = props
        .get("level")
        .and_then(coerce_f64)
        .map(f64::trunc)
        .filter(|level| (1.0..=6.0).contains(level))
        .map_or(DEFAULT_HEADING_LEVEL, |level| level as u8);
    props.insert("level".to_string(), Value::from(level));
}

fn default_alignment(props: &mut Props) {
    props
        .entry("textAlignment")
        .or_insert_with(|| Value::from(DEFAULT_TEXT_ALIGNMENT));
}
