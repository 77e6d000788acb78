//! Error types for tomes_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using tomes_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning, importing or persisting the catalog.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A source path or configuration value is missing or invalid.
    #[error("Configuration error at {path}: {reason}")]
    Configuration { path: PathBuf, reason: String },

    /// Metadata could not be read from a candidate file.
    #[error("Could not extract metadata from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    /// The hash ledger or the collection could not be read or written.
    #[error("Storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    /// A manually entered value was rejected.
    #[error("Invalid value: {reason}")]
    Validation { reason: String },

    /// A ledger entry is not a well-formed content hash.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// No catalog entry carries this ID.
    #[error("No book with ID {id}")]
    EntryNotFound { id: u64 },

    /// A batch finished without committing a single candidate.
    #[error("Nothing to import, epubs already in library")]
    NothingToImport,
}

impl Error {
    /// Create a Configuration error.
    pub fn configuration(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Configuration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Extraction error.
    pub fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Extraction {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a StorageUnavailable error.
    pub fn storage_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::StorageUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an EntryNotFound error.
    pub fn entry_not_found(id: u64) -> Self {
        Error::EntryNotFound { id }
    }

    /// Whether this error must abort the whole import batch.
    ///
    /// Everything else only costs the candidate being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::StorageUnavailable { .. } | Error::Configuration { .. }
        )
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        err.error.into()
    }
}
