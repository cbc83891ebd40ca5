//! Persisted tracker entities.
//!
//! Each struct is the aggregate the core works with: the owner row plus the
//! value rows stored against it (attribute values on a tracked entity, data
//! values on an event). Storage keeps owner and value rows apart and
//! assembles the aggregate on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracker_types::{EnrollmentStatus, EventStatus, TrackerType, Uid};

use crate::{AttributeValue, AuditInfo, DataValue, Relationship, UserInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub uid: Uid,
    pub tracked_entity_type: Uid,
    pub org_unit: Uid,
    #[serde(default)]
    pub attribute_values: BTreeMap<Uid, AttributeValue>,
    pub deleted: bool,
    pub audit: AuditInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub uid: Uid,
    pub tracked_entity: Uid,
    pub program: Uid,
    pub org_unit: Uid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub deleted: bool,
    pub audit: AuditInfo,
}

/// An event recorded under an enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    pub uid: Uid,
    pub enrollment: Uid,
    pub program_stage: Uid,
    pub org_unit: Uid,
    pub status: EventStatus,
    pub occurred_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data_values: BTreeMap<Uid, DataValue>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub deleted: bool,
    pub audit: AuditInfo,
}

/// An event in a program without registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleEvent {
    pub uid: Uid,
    pub program_stage: Uid,
    pub org_unit: Uid,
    pub status: EventStatus,
    pub occurred_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data_values: BTreeMap<Uid, DataValue>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub deleted: bool,
    pub audit: AuditInfo,
}

/// Append-only free-text note on an enrollment or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub uid: Uid,
    pub value: String,
    pub created_by: UserInfo,
    pub created: DateTime<Utc>,
}

/// Any of the five persisted kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entity", rename_all = "camelCase")]
pub enum TrackerEntity {
    TrackedEntity(TrackedEntity),
    Enrollment(Enrollment),
    TrackerEvent(TrackerEvent),
    SingleEvent(SingleEvent),
    Relationship(Relationship),
}

impl TrackerEntity {
    pub fn uid(&self) -> Uid {
        match self {
            Self::TrackedEntity(e) => e.uid,
            Self::Enrollment(e) => e.uid,
            Self::TrackerEvent(e) => e.uid,
            Self::SingleEvent(e) => e.uid,
            Self::Relationship(e) => e.uid,
        }
    }

    pub fn tracker_type(&self) -> TrackerType {
        match self {
            Self::TrackedEntity(_) => TrackerType::TrackedEntity,
            Self::Enrollment(_) => TrackerType::Enrollment,
            Self::TrackerEvent(_) => TrackerType::TrackerEvent,
            Self::SingleEvent(_) => TrackerType::SingleEvent,
            Self::Relationship(_) => TrackerType::Relationship,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Self::TrackedEntity(e) => e.deleted,
            Self::Enrollment(e) => e.deleted,
            Self::TrackerEvent(e) => e.deleted,
            Self::SingleEvent(e) => e.deleted,
            Self::Relationship(e) => e.deleted,
        }
    }

    pub fn audit(&self) -> &AuditInfo {
        match self {
            Self::TrackedEntity(e) => &e.audit,
            Self::Enrollment(e) => &e.audit,
            Self::TrackerEvent(e) => &e.audit,
            Self::SingleEvent(e) => &e.audit,
            Self::Relationship(e) => &e.audit,
        }
    }

    pub fn audit_mut(&mut self) -> &mut AuditInfo {
        match self {
            Self::TrackedEntity(e) => &mut e.audit,
            Self::Enrollment(e) => &mut e.audit,
            Self::TrackerEvent(e) => &mut e.audit,
            Self::SingleEvent(e) => &mut e.audit,
            Self::Relationship(e) => &mut e.audit,
        }
    }

    /// Marks the entity soft-deleted.
    pub fn mark_deleted(&mut self) {
        match self {
            Self::TrackedEntity(e) => e.deleted = true,
            Self::Enrollment(e) => e.deleted = true,
            Self::TrackerEvent(e) => e.deleted = true,
            Self::SingleEvent(e) => e.deleted = true,
            Self::Relationship(e) => e.deleted = true,
        }
    }
}

impl From<TrackedEntity> for TrackerEntity {
    fn from(value: TrackedEntity) -> Self {
        Self::TrackedEntity(value)
    }
}

impl From<Enrollment> for TrackerEntity {
    fn from(value: Enrollment) -> Self {
        Self::Enrollment(value)
    }
}

impl From<TrackerEvent> for TrackerEntity {
    fn from(value: TrackerEvent) -> Self {
        Self::TrackerEvent(value)
    }
}

impl From<SingleEvent> for TrackerEntity {
    fn from(value: SingleEvent) -> Self {
        Self::SingleEvent(value)
    }
}

impl From<Relationship> for TrackerEntity {
    fn from(value: Relationship) -> Self {
        Self::Relationship(value)
    }
}
