//! Section extraction and re-packing.
//!
//! # Responsibility
//! - Recognize every stored `content_json` shape (`envelope`).
//! - Derive editable sections from a stored record (`extract`).
//! - Pack edited sections into ordered write variants (`pack`).
//!
//! # Invariants
//! - Extraction never fails and always yields at least one section.
//! - Everything `pack` writes is recognized by `extract`.

pub mod envelope;
pub mod extract;
pub mod pack;
