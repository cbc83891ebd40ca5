//! Storage layer for the tracker persistence core.
//!
//! Defines the storage-engine contract the core writes through and ships a
//! SQLite engine implementing it.
//!
//! # Architecture
//!
//! - Owner rows (tracked entities, enrollments, events, relationships) and
//!   value rows (attribute values, data values) are stored separately; reads
//!   assemble the aggregate
//! - Writes happen inside one transaction; reads see the transaction's own
//!   writes
//! - Reference constraints are checked when pending writes are flushed,
//!   never on the write itself, so a caller decides whether violations
//!   surface per object or at commit. Key uniqueness is checked on write
//! - Savepoints let a caller undo one object's writes without abandoning the
//!   transaction
//! - Deletes of the five entity kinds are soft; storage never cascades

mod error;
mod sqlite;
mod store;

pub use error::{StorageError, StorageResult};
pub use sqlite::SqliteStore;
pub use store::{
    ChangeLogStore, EntityStore, FileResourceStore, NotificationStore, Savepoint, TrackerStore,
    Transactional, ValueStore,
};
