//! Closed vocabularies shared across the workspace.
//!
//! Every enum serializes with the upper-snake-case names used on the wire
//! (`CREATE_AND_UPDATE`, `TRACKED_ENTITY`, ...) and parses the same names
//! through `FromStr`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the wire name of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(crate::Error::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// The five kinds of tracker object the core persists and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerType {
    TrackedEntity,
    Enrollment,
    TrackerEvent,
    SingleEvent,
    Relationship,
}

wire_names!(TrackerType, "tracker type", {
    TrackedEntity => "TRACKED_ENTITY",
    Enrollment => "ENROLLMENT",
    TrackerEvent => "TRACKER_EVENT",
    SingleEvent => "SINGLE_EVENT",
    Relationship => "RELATIONSHIP",
});

impl TrackerType {
    /// Order in which a bundle is committed: parents before children,
    /// relationships last so both sides already exist.
    pub const COMMIT_ORDER: [TrackerType; 5] = [
        TrackerType::TrackedEntity,
        TrackerType::Enrollment,
        TrackerType::TrackerEvent,
        TrackerType::SingleEvent,
        TrackerType::Relationship,
    ];

    /// Order in which a bundle is deleted: the reverse of [`Self::COMMIT_ORDER`].
    pub const DELETION_ORDER: [TrackerType; 5] = [
        TrackerType::Relationship,
        TrackerType::SingleEvent,
        TrackerType::TrackerEvent,
        TrackerType::Enrollment,
        TrackerType::TrackedEntity,
    ];
}

/// What the caller asked the import to do with the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStrategy {
    Create,
    Update,
    #[default]
    CreateAndUpdate,
    Delete,
}

wire_names!(ImportStrategy, "import strategy", {
    Create => "CREATE",
    Update => "UPDATE",
    CreateAndUpdate => "CREATE_AND_UPDATE",
    Delete => "DELETE",
});

/// Failure policy of a run.
///
/// `All` aborts the whole bundle on the first failure; `Object` skips the
/// failing object and continues with the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtomicMode {
    #[default]
    All,
    Object,
}

wire_names!(AtomicMode, "atomic mode", {
    All => "ALL",
    Object => "OBJECT",
});

/// When pending writes are checked against storage constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlushMode {
    /// After every persisted object.
    Object,
    /// Once, when the transaction commits.
    #[default]
    Auto,
}

wire_names!(FlushMode, "flush mode", {
    Object => "OBJECT",
    Auto => "AUTO",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

wire_names!(EnrollmentStatus, "enrollment status", {
    Active => "ACTIVE",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Active,
    Completed,
    Visited,
    Schedule,
    Overdue,
    Skipped,
}

wire_names!(EventStatus, "event status", {
    Active => "ACTIVE",
    Completed => "COMPLETED",
    Visited => "VISITED",
    Schedule => "SCHEDULE",
    Overdue => "OVERDUE",
    Skipped => "SKIPPED",
});

/// Value type of an attribute or data element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    #[default]
    Text,
    LongText,
    Number,
    Integer,
    Boolean,
    Date,
    OrganisationUnit,
    FileResource,
    Image,
}

wire_names!(ValueType, "value type", {
    Text => "TEXT",
    LongText => "LONG_TEXT",
    Number => "NUMBER",
    Integer => "INTEGER",
    Boolean => "BOOLEAN",
    Date => "DATE",
    OrganisationUnit => "ORGANISATION_UNIT",
    FileResource => "FILE_RESOURCE",
    Image => "IMAGE",
});

impl ValueType {
    /// Returns true if values of this type are file-resource uids.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::FileResource | Self::Image)
    }
}

/// Kind of a value-level change-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeLogType {
    Create,
    Update,
    Delete,
}

wire_names!(ChangeLogType, "change log type", {
    Create => "CREATE",
    Update => "UPDATE",
    Delete => "DELETE",
});
