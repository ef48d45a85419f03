//! Depth and size bounds for normalizing untrusted documents.
//!
//! # Invariants
//! - Unbounded limits never truncate anything.
//! - Exceeding a bound truncates (fails closed) and is reported through
//!   `Truncation`; it is never an error.

/// Optional bounds applied while walking a block tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeLimits {
    /// Deepest allowed nesting level; top-level blocks are depth 0.
    pub max_depth: Option<usize>,
    /// Maximum number of blocks kept across the whole tree.
    pub max_blocks: Option<usize>,
}

impl NormalizeLimits {
    pub const fn unbounded() -> Self {
        Self {
            max_depth: None,
            max_blocks: None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_depth.is_none() && self.max_blocks.is_none()
    }
}

/// What a bounded normalization had to cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Truncation {
    /// Child lists emptied because they sat below `max_depth`.
    pub pruned_subtrees: usize,
    /// Blocks skipped because `max_blocks` was reached.
    pub dropped_blocks: usize,
}

impl Truncation {
    pub fn is_empty(&self) -> bool {
        self.pruned_subtrees == 0 && self.dropped_blocks == 0
    }

    pub fn absorb(&mut self, other: Truncation) {
        self.pruned_subtrees += other.pruned_subtrees;
        self.dropped_blocks += other.dropped_blocks;
    }
}

/// Running budget for one normalization pass.
#[derive(Debug)]
pub(crate) struct Budget {
    limits: NormalizeLimits,
    kept_blocks: usize,
    truncation: Truncation,
}

impl Budget {
    pub(crate) fn new(limits: NormalizeLimits) -> Self {
        Self {
            limits,
            kept_blocks: 0,
            truncation: Truncation::default(),
        }
    }

    /// Claims room for one more block, recording a drop when none is left.
    pub(crate) fn take_block(&mut self) -> bool {
        if let Some(max) = self.limits.max_blocks {
            if self.kept_blocks >= max {
                self.truncation.dropped_blocks += 1;
                return false;
            }
        }
        self.kept_blocks += 1;
        true
    }

    /// Whether blocks at `depth` may be kept; records a pruned subtree if not.
    pub(crate) fn enter_depth(&mut self, depth: usize) -> bool {
        match self.limits.max_depth {
            Some(max) if depth > max => {
                self.truncation.pruned_subtrees += 1;
                false
            }
            _ => true,
        }
    }

    pub(crate) fn finish(self) -> Truncation {
        self.truncation
    }
}
