//! Persistence orchestration for tracker imports.
//!
//! Takes validated payloads arranged as tracked entity → enrollment → event,
//! plus relationships between any of them, and
//! - upserts them through one generic persist algorithm with value-level
//!   diffing, change logs and file-resource bookkeeping, or
//! - deletes them children first, without relying on storage cascades.
//!
//! # Flow
//!
//! - [`TrackerImporter::import`] opens one transaction per bundle and runs a
//!   [`BundleRunner`] per kind in [`TrackerType::COMMIT_ORDER`](tracker_types::TrackerType::COMMIT_ORDER)
//! - Each runner drives a [`Persister`] over its payloads, consulting and
//!   updating the [`Preheat`]
//! - Persisters reconcile values with [`differ::diff`] and the value handler
//! - Failures abort the bundle ([`AtomicMode::All`](tracker_types::AtomicMode::All))
//!   or skip the object ([`AtomicMode::Object`](tracker_types::AtomicMode::Object))
//! - After commit, notification descriptors go to the
//!   [`NotificationDispatcher`]
//! - [`DeletionService`] deletes by uid; [`TrackerImporter::delete`] wraps it
//!   in a transaction

mod bundle;
mod context;
mod converter;
mod deletion;
pub mod differ;
mod error;
mod notification;
mod params;
pub mod persister;
mod preheat;
pub mod report;
mod reserved;
mod runner;
pub mod value_handler;

pub use bundle::{TrackerBundle, TrackerImporter};
pub use context::{PersistContext, UsedValue};
pub use converter::{DefaultConverter, TrackerConverter};
pub use deletion::DeletionService;
pub use error::{ImportError, ImportResult};
pub use notification::{
    ChannelDispatcher, NotificationDescriptor, NotificationDispatcher, NotificationTrigger,
};
pub use params::ImportParams;
pub use persister::Persister;
pub use preheat::Preheat;
pub use report::{DeletionReport, ImportReport, ImportStatus, Outcome, Stats, TypeReport};
pub use reserved::{InMemoryReservedValues, ReservedValueService};
pub use runner::BundleRunner;
