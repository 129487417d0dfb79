//! Error types for vulnfeed.
//!
//! Library crates use [`VulnfeedError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all vulnfeed operations.
#[derive(Debug, thiserror::Error)]
pub enum VulnfeedError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Snapshot deserialization error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A required date field in a feed record did not parse.
    /// Record-scoped: carries the record identifier so the caller can
    /// skip-and-continue or abort the batch.
    #[error("record {record}: malformed date {value:?} (expected YYYY-MM-DD)")]
    MalformedDate { record: String, value: String },

    /// Ingestion state lacks a usable content digest. Batch-scoped and fatal:
    /// no entity may be emitted without provenance.
    #[error("missing provenance: {message}")]
    MissingProvenance { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VulnfeedError>;

impl VulnfeedError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-date error for a record's date field.
    pub fn malformed_date(record: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedDate {
            record: record.into(),
            value: value.into(),
        }
    }

    /// Create a missing-provenance error.
    pub fn missing_provenance(msg: impl Into<String>) -> Self {
        Self::MissingProvenance {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
