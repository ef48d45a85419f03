//! Explicit engine configuration.
//!
//! # Responsibility
//! - Collect backend choice, logging setup, normalization limits and write
//!   verbosity in one value passed to constructors.
//!
//! # Invariants
//! - Nothing here reads process-wide state; callers build the value.

use crate::normalize::limits::NormalizeLimits;
use crate::service::persistence::AdapterOptions;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidFallbackDate(String),
    /// A limit of zero would discard every document.
    ZeroLimit(&'static str),
    EmptySqlitePath,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFallbackDate(value) => {
                write!(f, "fallback date `{value}` is not a YYYY-MM-DD date")
            }
            Self::ZeroLimit(name) => write!(f, "{name} must be at least 1 when set"),
            Self::EmptySqlitePath => write!(f, "sqlite backend requires a database path"),
        }
    }
}

impl Error for ConfigError {}

/// Complete engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub backend: StorageBackend,
    /// `None` leaves logging uninitialized.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
    pub limits: NormalizeLimits,
    pub verbose: bool,
    /// `YYYY-MM-DD`.
    pub fallback_date: Option<String>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(date) = &self.fallback_date {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidFallbackDate(date.clone()))?;
        }
        if self.limits.max_blocks == Some(0) {
            return Err(ConfigError::ZeroLimit("max_blocks"));
        }
        if let StorageBackend::Sqlite { path } = &self.backend {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptySqlitePath);
            }
        }
        Ok(())
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            limits: self.limits,
            verbose: self.verbose,
            fallback_date: self.fallback_date.clone(),
        }
    }
}
