//! Persistence adapter.
//!
//! # Responsibility
//! - Load a raw record through the storage collaborator and derive sections.
//! - Save sections by trying the ordered write variants until one is accepted.
//!
//! # Invariants
//! - Collaborator failures are the only errors visible to callers.
//! - Each save attempt is exactly one `RecordStore::set` call; attempts stop at
//!   the first success.
//! - Reading accepts every variant this adapter writes.
//!
//! # See also
//! - crate::sections::pack

use crate::logging::sanitize_message;
use crate::model::record::{EnvelopeShape, StoredRecord};
use crate::model::section::{Section, SectionId};
use crate::normalize::limits::{NormalizeLimits, Truncation};
use crate::repo::record_store::{RecordStore, StoreError};
use crate::sections::extract::{extract_sections, ExtractContext};
use crate::sections::pack::from_sections;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_PAYLOAD_PREVIEW_CHARS: usize = 240;

/// Adapter-facing subset of the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct AdapterOptions {
    pub limits: NormalizeLimits,
    /// Logs a sanitized preview of every write payload at `debug`.
    pub verbose: bool,
    /// Section date when a record has no reference date; today when unset.
    pub fallback_date: Option<String>,
}

/// Error surfaced by load and save.
#[derive(Debug)]
pub enum EngineError {
    Load {
        record_id: String,
        source: StoreError,
    },
    /// Every write variant was refused; `last` is the final refusal.
    AllVariantsRejected {
        record_id: String,
        attempts: usize,
        last: StoreError,
    },
    Encode(serde_json::Error),
    UnknownSection(SectionId),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load { record_id, source } => {
                write!(f, "failed to load record {record_id}: {source}")
            }
            Self::AllVariantsRejected {
                record_id,
                attempts,
                last,
            } => write!(
                f,
                "all {attempts} save variants were rejected for record {record_id}; last error: {last}"
            ),
            Self::Encode(err) => write!(f, "failed to encode sections: {err}"),
            Self::UnknownSection(id) => write!(f, "section not found: {id}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load { source, .. } => Some(source),
            Self::AllVariantsRejected { last, .. } => Some(last),
            Self::Encode(err) => Some(err),
            Self::UnknownSection(_) => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// A record together with its derived sections.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub record: StoredRecord,
    /// Never empty.
    pub sections: Vec<Section>,
    /// Recognized `content_json` shape; `None` when defaults were used.
    pub shape: Option<EnvelopeShape>,
    pub truncation: Truncation,
}

/// Which variant a save ended up writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub shape: EnvelopeShape,
    /// 1-based number of attempts, including the successful one.
    pub attempts: usize,
}

/// Loads and saves documents through a storage collaborator.
pub struct PersistenceAdapter<S: RecordStore> {
    store: S,
    options: AdapterOptions,
}

impl<S: RecordStore> PersistenceAdapter<S> {
    pub fn new(store: S, options: AdapterOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Reads the record stored under `record_id` and derives its sections.
    ///
    /// A missing record loads as an empty document.
    ///
    /// # Errors
    /// - Returns `EngineError::Load` when the collaborator fails.
    pub fn load(&self, record_id: &str) -> Result<LoadedDocument, EngineError> {
        info!("event=document_load module=service status=start record_id={record_id}");
        let raw = match self.store.get(record_id) {
            Ok(raw) => raw,
            Err(err) => {
                error!(
                    "event=document_load module=service status=error record_id={record_id} error_code=store_get_failed error={err}"
                );
                return Err(EngineError::Load {
                    record_id: record_id.to_string(),
                    source: err,
                });
            }
        };

        let record = match raw {
            Some(raw) => StoredRecord::from_value(record_id, &raw),
            None => StoredRecord::empty(record_id),
        };
        let context = ExtractContext {
            fallback_date: self.options.fallback_date.clone(),
            limits: self.options.limits,
        };
        let extraction = extract_sections(&record, &context);

        info!(
            "event=document_load module=service status=ok record_id={record_id} shape={} sections={}",
            extraction.shape.map_or("default", EnvelopeShape::as_str),
            extraction.sections.len()
        );
        Ok(LoadedDocument {
            record,
            sections: extraction.sections,
            shape: extraction.shape,
            truncation: extraction.truncation,
        })
    }

    /// Like `load`, but degrades a collaborator failure to an empty document.
    pub fn load_or_empty(&self, record_id: &str) -> LoadedDocument {
        match self.load(record_id) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "event=document_load module=service status=degraded record_id={record_id} error={err}"
                );
                let record = StoredRecord::empty(record_id);
                let extraction = extract_sections(
                    &record,
                    &ExtractContext {
                        fallback_date: self.options.fallback_date.clone(),
                        limits: self.options.limits,
                    },
                );
                LoadedDocument {
                    record,
                    sections: extraction.sections,
                    shape: None,
                    truncation: extraction.truncation,
                }
            }
        }
    }

    /// Writes `sections` using the first variant the collaborator accepts.
    ///
    /// # Errors
    /// - Returns `EngineError::Encode` when sections cannot be serialized.
    /// - Returns `EngineError::AllVariantsRejected` when every attempt fails.
    pub fn save(
        &mut self,
        record_id: &str,
        sections: &[Section],
    ) -> Result<SaveOutcome, EngineError> {
        let packed = from_sections(sections)?;
        info!(
            "event=document_save module=service status=start record_id={record_id} sections={} variants={}",
            packed.sections.len(),
            packed.variants.len()
        );

        let mut last_error = None;
        for (index, variant) in packed.variants.iter().enumerate() {
            let attempt = index + 1;
            let payload = packed.payload(variant)?;
            if self.options.verbose {
                debug!(
                    "event=document_save module=service status=attempt record_id={record_id} attempt={attempt} shape={} payload={}",
                    variant.shape.as_str(),
                    sanitize_message(&payload.to_string(), MAX_PAYLOAD_PREVIEW_CHARS)
                );
            }

            match self.store.set(record_id, &payload) {
                Ok(()) => {
                    info!(
                        "event=document_save module=service status=ok record_id={record_id} attempt={attempt} shape={}",
                        variant.shape.as_str()
                    );
                    return Ok(SaveOutcome {
                        shape: variant.shape,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    warn!(
                        "event=document_save module=service status=retry record_id={record_id} attempt={attempt} shape={} error={err}",
                        variant.shape.as_str()
                    );
                    last_error = Some(err);
                }
            }
        }

        let attempts = packed.variants.len();
        error!(
            "event=document_save module=service status=error record_id={record_id} attempts={attempts} error_code=all_variants_rejected"
        );
        Err(EngineError::AllVariantsRejected {
            record_id: record_id.to_string(),
            attempts,
            last: last_error.unwrap_or_else(|| StoreError::Rejected {
                reason: "no write variant was produced".to_string(),
            }),
        })
    }
}
