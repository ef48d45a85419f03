//! Document normalization and resilient persistence engine for ad logs.
//!
//! Stored documents arrive in many historical shapes; this crate turns any of
//! them into one canonical block tree, derives editable sections from it, and
//! writes edits back through an ordered list of compatible encodings.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod render;
pub mod repo;
pub mod sections;
pub mod service;

pub use config::{ConfigError, EngineConfig, StorageBackend};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::block::{Block, BlockContent, BlockKind};
pub use model::inline::{Inline, InlineRun, StyleValue};
pub use model::record::{EnvelopeShape, StoredRecord};
pub use model::section::{Attachment, Section, SectionId};
pub use model::table::{CellProps, TableCell, TableContent, TableRow};
pub use normalize::block::normalize_block;
pub use normalize::document::{normalize_document, normalize_document_with, NormalizedDocument};
pub use normalize::inline::normalize_inline;
pub use normalize::limits::{NormalizeLimits, Truncation};
pub use normalize::table::normalize_table;
pub use render::{to_html, to_markdown, to_plain_text};
pub use repo::memory_store::MemoryRecordStore;
pub use repo::record_store::{RecordStore, ShapePolicy, StoreError, StoreResult};
pub use repo::sqlite_store::SqliteRecordStore;
pub use sections::extract::{extract_sections, to_sections, ExtractContext, Extraction};
pub use sections::pack::{from_sections, EncodedVariant, PackedSection, PackedSections};
pub use service::persistence::{
    AdapterOptions, EngineError, LoadedDocument, PersistenceAdapter, SaveOutcome,
};
pub use service::session::EditSession;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
