//! Error types for tracker import and deletion.

use thiserror::Error;
use tracker_storage::StorageError;
use tracker_types::{TrackerType, Uid};

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors raised while persisting or deleting tracker objects.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The object to delete, or a parent an object depends on, does not exist.
    #[error("{tracker_type} {uid} not found")]
    NotFound { tracker_type: TrackerType, uid: Uid },

    /// A payload refers to metadata the preheat was not loaded with.
    #[error("{kind} {uid} is not in the preheat")]
    MissingMetadata { kind: &'static str, uid: Uid },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("reserved value error: {0}")]
    ReservedValue(String),

    /// A value that must hold an identifier (a file reference) does not.
    #[error("invalid identifier: {0}")]
    Identifier(#[from] tracker_types::Error),

    /// One object failed to persist under all-or-nothing atomicity.
    #[error("failed to persist {tracker_type}: {source}")]
    Persistence {
        tracker_type: TrackerType,
        uid: Option<Uid>,
        #[source]
        source: Box<ImportError>,
    },

    #[error("invalid import parameters: {0}")]
    Config(#[from] serde_json::Error),
}
