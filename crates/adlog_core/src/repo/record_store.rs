//! Storage collaborator contract.
//!
//! # Responsibility
//! - Define the narrow `get`/`set` contract the persistence adapter writes
//!   through, independent of where records live.
//! - Provide the PATCH merge and shape policy shared by implementations.
//!
//! # Invariants
//! - `set` merges the patch into the stored record; fields absent from the
//!   patch are left untouched.
//! - One `set` call is atomic: it either applies the whole patch or nothing.
//!
//! # See also
//! - crate::service::persistence

use crate::db::DbError;
use crate::model::record::{FIELD_CONTENT_JSON, FIELD_UPDATED_AT};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a storage collaborator.
#[derive(Debug)]
pub enum StoreError {
    /// The collaborator refused the payload (e.g. unsupported shape).
    Rejected { reason: String },
    Db(DbError),
    InvalidData(String),
    Serialization(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { reason } => write!(f, "record store rejected the write: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
            Self::Serialization(err) => write!(f, "record serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Rejected { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Record persistence collaborator.
pub trait RecordStore {
    /// Returns the raw record stored under `id`, if any.
    fn get(&self, id: &str) -> StoreResult<Option<Value>>;
    /// Merges `patch` into the record stored under `id`, creating it when
    /// missing.
    fn set(&mut self, id: &str, patch: &Value) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn get(&self, id: &str) -> StoreResult<Option<Value>> {
        (**self).get(id)
    }

    fn set(&mut self, id: &str, patch: &Value) -> StoreResult<()> {
        (**self).set(id, patch)
    }
}

/// Which `content_json` shapes a store accepts.
///
/// Models backends with a typed `content_json` column; the default accepts
/// everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapePolicy {
    pub arrays: bool,
    pub objects: bool,
    pub strings: bool,
}

impl Default for ShapePolicy {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl ShapePolicy {
    pub const fn accept_all() -> Self {
        Self {
            arrays: true,
            objects: true,
            strings: true,
        }
    }

    /// Backend whose `content_json` column is a plain string.
    pub const fn strings_only() -> Self {
        Self {
            arrays: false,
            objects: false,
            strings: true,
        }
    }

    /// Rejects a patch whose `content_json` has a shape this policy refuses.
    pub fn check(&self, patch: &Value) -> StoreResult<()> {
        let Some(content) = patch.get(FIELD_CONTENT_JSON) else {
            return Ok(());
        };
        let (allowed, shape) = match content {
            Value::Array(_) => (self.arrays, "array"),
            Value::Object(_) => (self.objects, "object"),
            Value::String(_) => (self.strings, "string"),
            _ => (true, "scalar"),
        };
        if allowed {
            Ok(())
        } else {
            Err(StoreError::Rejected {
                reason: format!("content_json of shape {shape} is not accepted"),
            })
        }
    }
}

/// Shallow PATCH merge: every top-level patch field replaces the stored one,
/// then `updated_at` is stamped.
pub fn merge_patch(
    current: Option<Value>,
    patch: &Value,
    updated_at: &str,
) -> StoreResult<Map<String, Value>> {
    let Value::Object(fields) = patch else {
        return Err(StoreError::InvalidData(
            "record patch must be a JSON object".to_string(),
        ));
    };

    let mut merged = match current {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in fields {
        merged.insert(key.clone(), value.clone());
    }
    merged.insert(FIELD_UPDATED_AT.to_string(), Value::from(updated_at));
    Ok(merged)
}
