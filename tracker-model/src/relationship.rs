use serde::{Deserialize, Serialize};
use std::fmt;
use tracker_types::Uid;

use crate::AuditInfo;

/// One side of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipItem {
    TrackedEntity(Uid),
    Enrollment(Uid),
    Event(Uid),
}

impl RelationshipItem {
    pub fn uid(&self) -> Uid {
        match self {
            Self::TrackedEntity(uid) | Self::Enrollment(uid) | Self::Event(uid) => *uid,
        }
    }

    /// Returns the tracked entity uid if this side names one directly.
    pub fn tracked_entity(&self) -> Option<Uid> {
        match self {
            Self::TrackedEntity(uid) => Some(*uid),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrackedEntity(uid) => write!(f, "trackedEntity:{uid}"),
            Self::Enrollment(uid) => write!(f, "enrollment:{uid}"),
            Self::Event(uid) => write!(f, "event:{uid}"),
        }
    }
}

/// Structural identity of a relationship: type plus both sides.
///
/// Relationships may arrive without a uid, so existence is decided on this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub relationship_type: Uid,
    pub from: RelationshipItem,
    pub to: RelationshipItem,
}

impl RelationshipKey {
    /// The same link read from the other side.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            relationship_type: self.relationship_type,
            from: self.to,
            to: self.from,
        }
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.relationship_type, self.from, self.to)
    }
}

/// A directed, typed link between two tracker objects. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub uid: Uid,
    pub relationship_type: Uid,
    pub from: RelationshipItem,
    pub to: RelationshipItem,
    pub deleted: bool,
    pub audit: AuditInfo,
}

impl Relationship {
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            relationship_type: self.relationship_type,
            from: self.from,
            to: self.to,
        }
    }

    /// Returns true if either side names `item`.
    pub fn touches(&self, item: &RelationshipItem) -> bool {
        self.from == *item || self.to == *item
    }
}
