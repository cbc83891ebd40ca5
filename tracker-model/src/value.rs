use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracker_types::Uid;

use crate::UserInfo;

/// One tracked-entity attribute value row, keyed by (tracked entity, attribute).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub attribute: Uid,
    pub value: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub stored_by: String,
}

impl AttributeValue {
    pub fn new(attribute: Uid, value: impl Into<String>, user: &UserInfo, now: DateTime<Utc>) -> Self {
        Self {
            attribute,
            value: value.into(),
            created: now,
            last_updated: now,
            stored_by: user.username.clone(),
        }
    }
}

/// One event data value row, keyed by (event, data element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    pub data_element: Uid,
    pub value: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub created_by: UserInfo,
    pub last_updated_by: UserInfo,
}

impl DataValue {
    pub fn new(data_element: Uid, value: impl Into<String>, user: &UserInfo, now: DateTime<Utc>) -> Self {
        Self {
            data_element,
            value: value.into(),
            created: now,
            last_updated: now,
            created_by: user.clone(),
            last_updated_by: user.clone(),
        }
    }
}
