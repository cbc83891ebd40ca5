//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row not found.
    #[error("row not found: {0}")]
    NotFound(String),

    /// A write broke a key constraint, or pending writes broke a reference
    /// constraint when flushed.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A write was attempted outside a transaction.
    #[error("no active transaction")]
    NoTransaction,

    /// `begin` was called while a transaction was already open.
    #[error("transaction already active")]
    TransactionActive,

    /// The savepoint was already released or rolled past.
    #[error("unknown savepoint: {0}")]
    UnknownSavepoint(usize),
}
