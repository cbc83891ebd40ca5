//! Value-level diff between an owner's stored values and a submitted set.
//!
//! The differ is pure: it only classifies keys. Side effects (rows, change
//! logs, file resources, reserved values) belong to the value handler.

use std::collections::{BTreeMap, BTreeSet};
use tracker_types::{ChangeLogType, Uid};

/// One classified key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueChange<K = Uid> {
    Create { key: K, value: String },
    Update { key: K, previous: String, value: String },
    Delete { key: K, previous: String },
}

impl<K> ValueChange<K> {
    pub fn key(&self) -> &K {
        match self {
            Self::Create { key, .. } | Self::Update { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    pub fn change_type(&self) -> ChangeLogType {
        match self {
            Self::Create { .. } => ChangeLogType::Create,
            Self::Update { .. } => ChangeLogType::Update,
            Self::Delete { .. } => ChangeLogType::Delete,
        }
    }

    pub fn previous(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { previous, .. } | Self::Delete { previous, .. } => Some(previous),
        }
    }

    pub fn current(&self) -> Option<&str> {
        match self {
            Self::Create { value, .. } | Self::Update { value, .. } => Some(value),
            Self::Delete { .. } => None,
        }
    }
}

/// Missing or whitespace-only.
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Classifies every key in the union of `old` and `new`, in key order.
///
/// A key missing from `new` is treated as submitted blank.
pub fn diff<K: Ord + Clone>(
    old: &BTreeMap<K, String>,
    new: &BTreeMap<K, Option<String>>,
) -> Vec<ValueChange<K>> {
    let keys: BTreeSet<&K> = old.keys().chain(new.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let previous = old.get(key);
            let value = new.get(key).and_then(|v| v.as_deref());
            classify(key, previous, value)
        })
        .collect()
}

fn classify<K: Clone>(key: &K, previous: Option<&String>, value: Option<&str>) -> Option<ValueChange<K>> {
    match (previous, value) {
        (None, Some(value)) if !is_blank(Some(value)) => Some(ValueChange::Create {
            key: key.clone(),
            value: value.to_string(),
        }),
        (Some(previous), Some(value)) if !is_blank(Some(value)) && previous != value => {
            Some(ValueChange::Update {
                key: key.clone(),
                previous: previous.clone(),
                value: value.to_string(),
            })
        }
        (Some(previous), value) if is_blank(value) && !is_blank(Some(previous)) => {
            Some(ValueChange::Delete {
                key: key.clone(),
                previous: previous.clone(),
            })
        }
        _ => None,
    }
}
