//! Document normalizer.

use crate::model::block::Block;
use crate::normalize::block::normalize_block_at;
use crate::normalize::limits::{Budget, NormalizeLimits, Truncation};
use log::warn;
use serde_json::Value;

/// Result of a bounded normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    /// Canonical, never empty.
    pub blocks: Vec<Block>,
    pub truncation: Truncation,
}

/// Canonicalizes a whole block sequence.
///
/// Non-sequence or empty input yields one blank paragraph.
pub fn normalize_document(blocks: &Value) -> Vec<Block> {
    normalize_document_with(blocks, NormalizeLimits::unbounded()).blocks
}

/// Canonicalizes a block sequence under `limits`.
///
/// Blocks beyond the bounds are dropped and counted in the returned
/// `Truncation`.
pub fn normalize_document_with(blocks: &Value, limits: NormalizeLimits) -> NormalizedDocument {
    let mut budget = Budget::new(limits);
    let mut normalized = Vec::new();
    if let Value::Array(items) = blocks {
        normalized.reserve(items.len());
        for item in items {
            if budget.take_block() {
                normalized.push(normalize_block_at(item, 0, &mut budget));
            }
        }
    }
    if normalized.is_empty() {
        normalized.push(Block::blank_paragraph());
    }

    let truncation = budget.finish();
    if !truncation.is_empty() {
        warn!(
            "event=document_normalize module=normalize status=truncated pruned_subtrees={} dropped_blocks={}",
            truncation.pruned_subtrees, truncation.dropped_blocks
        );
    }
    NormalizedDocument {
        blocks: normalized,
        truncation,
    }
}

/// Runs already-canonical blocks through the normalizer again.
///
/// Used on the write path so that hand-built or edited blocks are canonical
/// before they are encoded.
pub fn renormalize_blocks(blocks: &[Block]) -> serde_json::Result<Vec<Block>> {
    let value = serde_json::to_value(blocks)?;
    Ok(normalize_document(&value))
}

#[cfg(test)]
mod tests {
    use super::{normalize_document, normalize_document_with, renormalize_blocks};
    use crate::model::block::Block;
    use crate::normalize::limits::NormalizeLimits;
    use serde_json::json;

    #[test]
    fn empty_and_non_sequence_input_yield_blank_paragraph() {
        for input in [json!([]), json!(null), json!({"type": "paragraph"}), json!("x")] {
            assert_eq!(normalize_document(&input), vec![Block::blank_paragraph()]);
        }
    }

    #[test]
    fn depth_limit_prunes_nested_children() {
        let nested = json!([{
            "type": "paragraph",
            "children": [{"type": "paragraph", "children": [{"type": "paragraph"}]}]
        }]);
        let limits = NormalizeLimits {
            max_depth: Some(1),
            max_blocks: None,
        };
        let normalized = normalize_document_with(&nested, limits);
        assert_eq!(normalized.blocks[0].children.len(), 1);
        assert!(normalized.blocks[0].children[0].children.is_empty());
        assert_eq!(normalized.truncation.pruned_subtrees, 1);
    }

    #[test]
    fn block_limit_counts_children_too() {
        let input = json!([
            {"type": "paragraph", "children": [{"type": "paragraph"}]},
            {"type": "paragraph"}
        ]);
        let limits = NormalizeLimits {
            max_depth: None,
            max_blocks: Some(2),
        };
        let normalized = normalize_document_with(&input, limits);
        assert_eq!(normalized.blocks.len(), 1);
        assert_eq!(normalized.blocks[0].children.len(), 1);
        assert_eq!(normalized.truncation.dropped_blocks, 1);
    }

    #[test]
    fn renormalizing_canonical_blocks_is_a_no_op() {
        let blocks = vec![Block::heading(3, "Title"), Block::blank_paragraph()];
        assert_eq!(renormalize_blocks(&blocks).unwrap(), blocks);
    }
}
