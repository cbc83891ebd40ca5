use chrono::{DateTime, Utc};
use tracker_model::UserInfo;
use tracker_storage::TrackerStore;
use tracker_types::Uid;

use crate::{ImportParams, NotificationDescriptor, Preheat, TrackerConverter};

/// A generated attribute value stored by the run, as (text pattern, value).
pub type UsedValue = (String, String);

/// Everything one import run threads through the persisters.
///
/// Built per run and dropped when the run ends. Notification descriptors,
/// touched tracked entities and used reserved values accumulate here until
/// the run commits.
pub struct PersistContext<'a> {
    pub store: &'a mut dyn TrackerStore,
    pub preheat: &'a mut Preheat,
    pub params: &'a ImportParams,
    pub converter: &'a dyn TrackerConverter,
    /// Timestamp stamped on every row written by the run.
    pub now: DateTime<Utc>,
    pub notifications: Vec<NotificationDescriptor>,
    /// Tracked entities whose children changed; re-stamped before commit.
    pub touched: Vec<Uid>,
    /// Reserved values to mark used once the transaction commits.
    pub used_values: Vec<UsedValue>,
}

impl<'a> PersistContext<'a> {
    pub fn new(
        store: &'a mut dyn TrackerStore,
        preheat: &'a mut Preheat,
        params: &'a ImportParams,
        converter: &'a dyn TrackerConverter,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            preheat,
            params,
            converter,
            now,
            notifications: Vec::new(),
            touched: Vec::new(),
            used_values: Vec::new(),
        }
    }

    pub fn user(&self) -> &UserInfo {
        &self.params.user
    }
}
