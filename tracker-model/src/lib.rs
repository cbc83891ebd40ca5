//! Tracker domain model.
//!
//! Defines the types the persistence core moves between payloads, cache and
//! storage:
//! - [`metadata`]: configuration objects a payload refers to (programs,
//!   attributes, data elements, relationship types)
//! - persisted entities: [`TrackedEntity`], [`Enrollment`], [`TrackerEvent`],
//!   [`SingleEvent`], [`Relationship`], unified by [`TrackerEntity`]
//! - value rows: [`AttributeValue`], [`DataValue`]
//! - audit and side records: [`ChangeLogEntry`], [`Ownership`],
//!   [`FileResource`], [`NotificationInstance`]
//! - [`dto`]: validated import payloads handed to the persisters

mod audit;
pub mod dto;
mod entity;
pub mod metadata;
mod records;
mod relationship;
mod value;

pub use audit::{AuditInfo, UserInfo};
pub use entity::{Enrollment, Note, SingleEvent, TrackedEntity, TrackerEntity, TrackerEvent};
pub use metadata::{
    DataElement, Program, ProgramStage, RelationshipType, TrackedEntityAttribute,
    TrackedEntityType,
};
pub use records::{ChangeLogEntry, FileResource, NotificationInstance, Ownership};
pub use relationship::{Relationship, RelationshipItem, RelationshipKey};
pub use value::{AttributeValue, DataValue};
