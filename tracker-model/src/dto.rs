//! Validated import payloads.
//!
//! These arrive from upstream parsing and validation; the persistence core
//! assumes every reference they carry has already been checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracker_types::{EnrollmentStatus, EventStatus, Uid};

use crate::RelationshipItem;

/// A submitted attribute value. `None` or blank clears the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute: Uid,
    #[serde(default)]
    pub value: Option<String>,
}

/// A submitted data value. `None` or blank clears the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: Uid,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub uid: Uid,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub uid: Uid,
    pub tracked_entity_type: Uid,
    pub org_unit: Uid,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub uid: Uid,
    pub tracked_entity: Uid,
    pub program: Uid,
    pub org_unit: Uid,
    #[serde(default)]
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    /// Program attributes, stored on the enrolled tracked entity.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEvent {
    pub uid: Uid,
    pub enrollment: Uid,
    pub program_stage: Uid,
    pub org_unit: Uid,
    #[serde(default)]
    pub status: EventStatus,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub data_values: Vec<DataValue>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEvent {
    pub uid: Uid,
    pub program_stage: Uid,
    pub org_unit: Uid,
    #[serde(default)]
    pub status: EventStatus,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub data_values: Vec<DataValue>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Optional: relationships are identified by their structural key.
    #[serde(default)]
    pub uid: Option<Uid>,
    pub relationship_type: Uid,
    pub from: RelationshipItem,
    pub to: RelationshipItem,
}

/// Collects submitted attributes into the keyed set the value differ consumes.
/// A later entry for the same attribute wins.
pub fn attribute_set(attributes: &[Attribute]) -> BTreeMap<Uid, Option<String>> {
    attributes
        .iter()
        .map(|a| (a.attribute, a.value.clone()))
        .collect()
}

/// Collects submitted data values into the keyed set the value differ consumes.
/// A later entry for the same data element wins.
pub fn data_value_set(values: &[DataValue]) -> BTreeMap<Uid, Option<String>> {
    values
        .iter()
        .map(|v| (v.data_element, v.value.clone()))
        .collect()
}
