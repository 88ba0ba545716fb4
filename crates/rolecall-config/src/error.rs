//! Error types for configuration store operations.
//!
//! # Design
//! - Constant messages; context lives in fields so tests can match on them.
//! - Keep IO failures on the read side (`StoreUnavailable`) distinct from the
//!   write side (`PersistFailed`) because callers report them differently.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Primary error type for configuration store operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backing document could not be read.
    #[error("configuration store unavailable")]
    StoreUnavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Location of the backing document.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The backing document was not valid JSON for the expected layout.
    #[error("configuration document could not be parsed")]
    Parse {
        /// Location of the backing document.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
    /// The document parsed but violated a structural invariant.
    #[error("invalid configuration document")]
    InvalidDocument {
        /// Field path that failed validation.
        field: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Serialising the document for persistence failed.
    #[error("failed to serialize configuration document")]
    Serialize {
        /// Source serde error.
        source: serde_json::Error,
    },
    /// Writing or replacing the backing document failed.
    #[error("failed to persist configuration document")]
    PersistFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Location of the backing document.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The blocking writer task panicked or was cancelled.
    #[error("configuration writer task failed")]
    WriterTask {
        /// Source join error.
        source: tokio::task::JoinError,
    },
    /// The in-memory committed document is no longer usable.
    #[error("committed configuration state is poisoned")]
    StatePoisoned,
}

impl ConfigError {
    pub(crate) fn unavailable(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::StoreUnavailable {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn persist(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::PersistFailed {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(
        field: impl Into<String>,
        reason: &'static str,
        value: Option<&str>,
    ) -> Self {
        Self::InvalidDocument {
            field: field.into(),
            reason,
            value: value.map(str::to_string),
        }
    }

    /// Whether the failure happened while reading committed state rather than
    /// while writing a new revision.
    #[must_use]
    pub const fn is_read_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. }
                | Self::Parse { .. }
                | Self::InvalidDocument { .. }
                | Self::StatePoisoned
        )
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
