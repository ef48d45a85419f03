//! Storage collaborators.
//!
//! # Responsibility
//! - Define the `RecordStore` contract used by the persistence adapter.
//! - Provide in-memory and SQLite implementations treated uniformly.
//!
//! # Invariants
//! - Stores never interpret `content_json`; shape checks only look at its
//!   JSON type.
//!
//! # See also
//! - crate::db

pub mod memory_store;
pub mod record_store;
pub mod sqlite_store;
