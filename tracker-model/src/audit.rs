use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracker_types::Uid;

/// The acting user of a run, stamped on everything the run writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: Uid,
    pub username: String,
}

impl UserInfo {
    pub fn new(uid: Uid, username: impl Into<String>) -> Self {
        Self {
            uid,
            username: username.into(),
        }
    }

    /// The user stamped when a caller does not provide one.
    pub fn system() -> Self {
        Self {
            uid: Uid::nil(),
            username: "system".to_string(),
        }
    }
}

impl Default for UserInfo {
    fn default() -> Self {
        Self::system()
    }
}

/// Creation and last-update stamps carried by every persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub created_by: UserInfo,
    pub last_updated_by: UserInfo,
}

impl AuditInfo {
    /// Stamps for a row created by `user` at `now`.
    pub fn new(user: &UserInfo, now: DateTime<Utc>) -> Self {
        Self {
            created: now,
            last_updated: now,
            created_by: user.clone(),
            last_updated_by: user.clone(),
        }
    }

    /// Records that `user` changed the row at `now`.
    pub fn touch(&mut self, user: &UserInfo, now: DateTime<Utc>) {
        self.last_updated = now;
        self.last_updated_by = user.clone();
    }
}
