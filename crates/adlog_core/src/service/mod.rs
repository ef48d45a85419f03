//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate normalization, section extraction and the storage
//!   collaborator into load/edit/save use cases.
//! - Keep CLI and embedding layers decoupled from storage details.

pub mod persistence;
pub mod session;
