//! Error types for persistence operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during persistence operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to read from file system.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to file system.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize or parse JSON.
    #[error("failed to serialize: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to create directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Id cannot name a record (empty, or contains path characters).
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// Backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Lock poisoned (thread panicked while holding lock).
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl PersistenceError {
    /// Shorthand for a not-found error.
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        PersistenceError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
