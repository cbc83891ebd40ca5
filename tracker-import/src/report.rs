//! Per-kind and per-run outcome reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracker_types::{TrackerType, Uid};

/// What happened to one submitted object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    Ignored,
}

/// Counters of one [`TypeReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub ignored: usize,
}

impl Stats {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted + self.ignored
    }

    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &Stats) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.ignored += other.ignored;
    }
}

/// The outcome of one object, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Position of the object in its submitted list.
    pub index: usize,
    /// Absent when the object failed before it was given one.
    pub uid: Option<Uid>,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcomes for one tracker kind in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReport {
    pub tracker_type: TrackerType,
    pub stats: Stats,
    pub entries: Vec<Entry>,
}

impl TypeReport {
    pub fn new(tracker_type: TrackerType) -> Self {
        Self {
            tracker_type,
            stats: Stats::default(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, index: usize, uid: Option<Uid>, outcome: Outcome, message: Option<String>) {
        match outcome {
            Outcome::Created => self.stats.created += 1,
            Outcome::Updated => self.stats.updated += 1,
            Outcome::Deleted => self.stats.deleted += 1,
            Outcome::Ignored => self.stats.ignored += 1,
        }
        self.entries.push(Entry {
            index,
            uid,
            outcome,
            message,
        });
    }

    /// Uids of the entries with the given outcome, in order.
    pub fn uids(&self, outcome: Outcome) -> Vec<Uid> {
        self.entries
            .iter()
            .filter(|e| e.outcome == outcome)
            .filter_map(|e| e.uid)
            .collect()
    }
}

/// Overall status of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Ok,
    /// Committed, but some objects were ignored.
    Warning,
    /// Rolled back; nothing was persisted.
    Error,
}

/// The caller-facing result of one bundle import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub status: ImportStatus,
    pub type_reports: BTreeMap<TrackerType, TypeReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ImportReport {
    /// A committed run. Status is `Warning` if anything was ignored.
    pub fn completed(type_reports: BTreeMap<TrackerType, TypeReport>) -> Self {
        let ignored = type_reports.values().any(|r| r.stats.ignored > 0);
        Self {
            status: if ignored {
                ImportStatus::Warning
            } else {
                ImportStatus::Ok
            },
            type_reports,
            message: None,
        }
    }

    /// An aborted run: every kind reports zero counters.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ImportStatus::Error,
            type_reports: TrackerType::COMMIT_ORDER
                .into_iter()
                .map(|t| (t, TypeReport::new(t)))
                .collect(),
            message: Some(message.into()),
        }
    }

    pub fn type_report(&self, tracker_type: TrackerType) -> Option<&TypeReport> {
        self.type_reports.get(&tracker_type)
    }

    /// Counters summed over every kind.
    pub fn stats(&self) -> Stats {
        let mut total = Stats::default();
        for report in self.type_reports.values() {
            total.merge(&report.stats);
        }
        total
    }
}

/// The result of one deletion call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub type_reports: BTreeMap<TrackerType, TypeReport>,
    /// Every row deleted, in the order it was deleted.
    pub sequence: Vec<(TrackerType, Uid)>,
}

impl DeletionReport {
    pub fn record(&mut self, tracker_type: TrackerType, index: usize, uid: Uid, outcome: Outcome, message: Option<String>) {
        if outcome == Outcome::Deleted {
            self.sequence.push((tracker_type, uid));
        }
        self.type_reports
            .entry(tracker_type)
            .or_insert_with(|| TypeReport::new(tracker_type))
            .record(index, Some(uid), outcome, message);
    }

    pub fn stats(&self, tracker_type: TrackerType) -> Stats {
        self.type_reports
            .get(&tracker_type)
            .map(|r| r.stats)
            .unwrap_or_default()
    }
}

impl From<DeletionReport> for ImportReport {
    fn from(report: DeletionReport) -> Self {
        ImportReport::completed(report.type_reports)
    }
}
