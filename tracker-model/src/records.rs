use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracker_types::{ChangeLogType, TrackerType, Uid};

/// The org unit currently owning a tracked entity's data in one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub tracked_entity: Uid,
    pub program: Uid,
    pub org_unit: Uid,
}

/// Immutable audit record of one value-level change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub owner_type: TrackerType,
    pub owner: Uid,
    /// Attribute or data element uid.
    pub key: Uid,
    pub previous_value: Option<String>,
    pub current_value: Option<String>,
    pub change_type: ChangeLogType,
    pub created_by: String,
    pub created: DateTime<Utc>,
}

/// An uploaded file referenced by a file- or image-typed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResource {
    pub uid: Uid,
    pub name: String,
    /// True while some value references this file.
    pub assigned: bool,
    /// The tracked entity or event whose value references this file.
    pub owner: Option<Uid>,
}

impl FileResource {
    pub fn unassigned(uid: Uid, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
            assigned: false,
            owner: None,
        }
    }
}

/// A scheduled notification waiting to be sent for an enrollment or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationInstance {
    pub uid: Uid,
    pub owner_type: TrackerType,
    pub owner: Uid,
    pub template: Uid,
    pub scheduled_at: DateTime<Utc>,
}
