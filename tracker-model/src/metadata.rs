//! Metadata objects referenced by tracker payloads.
//!
//! Metadata is read-only for the persistence core: it is loaded into the
//! preheat before a run and only consulted to decide audit, file and
//! reserved-value behaviour.

use serde::{Deserialize, Serialize};
use tracker_types::{Uid, ValueType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntityType {
    pub uid: Uid,
    pub name: String,
    /// Whether attribute value changes of entities of this type are change-logged.
    #[serde(default)]
    pub allow_audit_log: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub uid: Uid,
    pub name: String,
    /// Whether event data value changes in this program are change-logged.
    #[serde(default)]
    pub allow_audit_log: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramStage {
    pub uid: Uid,
    pub name: String,
    pub program: Uid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntityAttribute {
    pub uid: Uid,
    pub name: String,
    pub value_type: ValueType,
    /// Values are generated from `text_pattern` and reserved ahead of use.
    #[serde(default)]
    pub generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_pattern: Option<String>,
}

impl TrackedEntityAttribute {
    /// Returns the text pattern when values of this attribute are reserved
    /// and must be marked as used once stored.
    pub fn reserved_pattern(&self) -> Option<&str> {
        if self.generated {
            self.text_pattern.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataElement {
    pub uid: Uid,
    pub name: String,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipType {
    pub uid: Uid,
    pub name: String,
    /// A bidirectional relationship is the same link read from either side.
    #[serde(default)]
    pub bidirectional: bool,
}
