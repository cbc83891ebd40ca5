//! Core type definitions for the tracker persistence core.
//!
//! This crate defines the small, storage-agnostic vocabulary shared by every
//! other crate in the workspace:
//! - Object identifiers (UUID v7)
//! - The five tracker object kinds and their processing order
//! - Run-wide import settings (strategy, atomicity, flush policy)
//! - Entity statuses, value types and change-log kinds
//!
//! Domain structs (tracked entities, enrollments, events, ...) live in
//! `tracker-model`, not here.

mod ids;
mod kinds;

pub use ids::Uid;
pub use kinds::{
    AtomicMode, ChangeLogType, EnrollmentStatus, EventStatus, FlushMode, ImportStrategy,
    TrackerType, ValueType,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing core types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UID: {0}")]
    InvalidUid(#[from] uuid::Error),

    #[error("unknown {kind} variant: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
