//! Run-wide import settings.

use serde::{Deserialize, Serialize};
use tracker_model::UserInfo;
use tracker_types::{AtomicMode, FlushMode, ImportStrategy};

use crate::ImportResult;

/// Settings shared by every persister in one import run.
///
/// Missing fields take their defaults when parsed: create-and-update,
/// all-or-nothing atomicity, flush at commit, side effects on, system user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportParams {
    pub import_strategy: ImportStrategy,
    pub atomic_mode: AtomicMode,
    pub flush_mode: FlushMode,
    /// Suppresses notification descriptors for this run.
    pub skip_side_effects: bool,
    /// The actor stamped on every row this run writes.
    pub user: UserInfo,
}

impl ImportParams {
    pub fn from_json(json: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_import_strategy(mut self, strategy: ImportStrategy) -> Self {
        self.import_strategy = strategy;
        self
    }

    pub fn with_atomic_mode(mut self, mode: AtomicMode) -> Self {
        self.atomic_mode = mode;
        self
    }

    pub fn with_flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    pub fn with_skip_side_effects(mut self, skip: bool) -> Self {
        self.skip_side_effects = skip;
        self
    }

    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.user = user;
        self
    }

    /// Whether each object must be checked against storage constraints
    /// before the next one starts.
    ///
    /// Best-effort runs always flush per object so a violation is charged to
    /// the object that caused it.
    pub fn flush_per_object(&self) -> bool {
        self.flush_mode == FlushMode::Object || self.atomic_mode == AtomicMode::Object
    }
}
