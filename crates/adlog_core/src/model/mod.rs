//! Canonical document model.
//!
//! # Responsibility
//! - Define the one normalized block-tree representation all consumers rely on.
//! - Define the derived `Section` view and the stored record view.
//!
//! # Invariants
//! - Values of these types are produced by the normalizers in `crate::normalize`;
//!   hand-built values should go through them again before being persisted.
//! - Serialization is infallible for every type in this module.

pub mod block;
pub mod inline;
pub mod record;
pub mod section;
pub mod table;
