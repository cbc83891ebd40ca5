//! Caller-level import service.
//!
//! [`TrackerImporter`] owns the store and the collaborators, runs a whole
//! [`TrackerBundle`] inside one transaction and hands notification
//! descriptors to the dispatcher once the transaction has committed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info, warn};
use tracker_model::{RelationshipKey, TrackerEntity, UserInfo, dto};
use tracker_storage::TrackerStore;
use tracker_types::{ImportStrategy, TrackerType, Uid};

use crate::persister::{
    EnrollmentPersister, RelationshipPersister, SingleEventPersister, TrackedEntityPersister,
    TrackerEventPersister,
};
use crate::report::{DeletionReport, ImportReport, TypeReport};
use crate::{
    BundleRunner, DefaultConverter, DeletionService, ImportParams, ImportResult,
    InMemoryReservedValues, NotificationDispatcher, PersistContext, Preheat,
    ReservedValueService, TrackerConverter,
};

/// One unit of work: validated payloads of every kind plus run settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerBundle {
    pub params: ImportParams,
    pub tracked_entities: Vec<dto::TrackedEntity>,
    pub enrollments: Vec<dto::Enrollment>,
    pub tracker_events: Vec<dto::TrackerEvent>,
    pub single_events: Vec<dto::SingleEvent>,
    pub relationships: Vec<dto::Relationship>,
}

impl TrackerBundle {
    pub fn new(params: ImportParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.tracked_entities.is_empty()
            && self.enrollments.is_empty()
            && self.tracker_events.is_empty()
            && self.single_events.is_empty()
            && self.relationships.is_empty()
    }

    /// Uids of the payloads of one kind. Relationships submitted without a
    /// uid are resolved by key against the preheat.
    fn uids(&self, tracker_type: TrackerType, preheat: &Preheat) -> ImportResult<Vec<Uid>> {
        Ok(match tracker_type {
            TrackerType::TrackedEntity => self.tracked_entities.iter().map(|d| d.uid).collect(),
            TrackerType::Enrollment => self.enrollments.iter().map(|d| d.uid).collect(),
            TrackerType::TrackerEvent => self.tracker_events.iter().map(|d| d.uid).collect(),
            TrackerType::SingleEvent => self.single_events.iter().map(|d| d.uid).collect(),
            TrackerType::Relationship => {
                let mut uids = Vec::with_capacity(self.relationships.len());
                for relationship in &self.relationships {
                    if let Some(uid) = relationship.uid {
                        uids.push(uid);
                        continue;
                    }
                    let key = RelationshipKey {
                        relationship_type: relationship.relationship_type,
                        from: relationship.from,
                        to: relationship.to,
                    };
                    let bidirectional = preheat
                        .relationship_type(&relationship.relationship_type)?
                        .bidirectional;
                    if let Some(uid) = preheat.relationship_uid(&key, bidirectional) {
                        uids.push(uid);
                    }
                }
                uids
            }
        })
    }
}

/// Persists and deletes tracker bundles against a store.
pub struct TrackerImporter<S: TrackerStore> {
    store: S,
    converter: Box<dyn TrackerConverter>,
    reserved: Box<dyn ReservedValueService>,
    dispatcher: Box<dyn NotificationDispatcher>,
}

impl<S: TrackerStore> TrackerImporter<S> {
    pub fn new(store: S, dispatcher: impl NotificationDispatcher + 'static) -> Self {
        Self {
            store,
            converter: Box::new(DefaultConverter),
            reserved: Box::new(InMemoryReservedValues::new()),
            dispatcher: Box::new(dispatcher),
        }
    }

    pub fn with_converter(mut self, converter: impl TrackerConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_reserved_values(mut self, reserved: impl ReservedValueService + 'static) -> Self {
        self.reserved = Box::new(reserved);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn reserved_values(&self) -> &dyn ReservedValueService {
        self.reserved.as_ref()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Imports a bundle. Never fails: a run that cannot commit is rolled back
    /// and reported with [`ImportStatus::Error`](crate::ImportStatus::Error).
    pub fn import(&mut self, bundle: &TrackerBundle, mut preheat: Preheat) -> ImportReport {
        let params = &bundle.params;
        info!(
            strategy = %params.import_strategy,
            atomic_mode = %params.atomic_mode,
            flush_mode = %params.flush_mode,
            user = %params.user.username,
            "starting tracker import"
        );

        if params.import_strategy == ImportStrategy::Delete {
            return match self.delete_bundle(bundle, &preheat) {
                Ok(report) => report.into(),
                Err(err) => {
                    error!(error = %err, "tracker deletion aborted");
                    ImportReport::error(err.to_string())
                }
            };
        }

        if let Err(err) = self.store.begin() {
            error!(error = %err, "could not open transaction");
            return ImportReport::error(err.to_string());
        }

        let mut ctx = PersistContext::new(
            &mut self.store,
            &mut preheat,
            params,
            self.converter.as_ref(),
            Utc::now(),
        );
        let outcome = persist_bundle(&mut ctx, bundle);
        let notifications = std::mem::take(&mut ctx.notifications);
        let used_values = std::mem::take(&mut ctx.used_values);
        drop(ctx);

        let outcome = outcome.and_then(|reports| {
            self.store.commit()?;
            Ok(reports)
        });

        match outcome {
            Ok(reports) => {
                let report = ImportReport::completed(reports);
                let stats = report.stats();
                info!(
                    status = ?report.status,
                    created = stats.created,
                    updated = stats.updated,
                    ignored = stats.ignored,
                    "tracker import committed"
                );
                for (text_pattern, value) in &used_values {
                    if let Err(err) = self.reserved.use_reserved_value(text_pattern, value) {
                        warn!(%text_pattern, %value, error = %err, "could not mark reserved value used");
                    }
                }
                if !notifications.is_empty() {
                    self.dispatcher.dispatch(notifications);
                }
                report
            }
            Err(err) => {
                if let Err(rollback) = self.store.rollback() {
                    error!(error = %rollback, "rollback failed");
                }
                error!(error = %err, "tracker import aborted, rolled back");
                ImportReport::error(err.to_string())
            }
        }
    }

    /// Deletes objects of one kind in their own transaction.
    pub fn delete(
        &mut self,
        tracker_type: TrackerType,
        uids: &[Uid],
        user: &UserInfo,
    ) -> ImportResult<DeletionReport> {
        self.in_transaction(user, |service| match tracker_type {
            TrackerType::TrackedEntity => service.delete_tracked_entities(uids),
            TrackerType::Enrollment => service.delete_enrollments(uids),
            TrackerType::TrackerEvent | TrackerType::SingleEvent => service.delete_events(uids),
            TrackerType::Relationship => service.delete_relationships(uids),
        })
    }

    /// Deletes every object a bundle names, children first.
    fn delete_bundle(&mut self, bundle: &TrackerBundle, preheat: &Preheat) -> ImportResult<DeletionReport> {
        let mut plan = Vec::with_capacity(TrackerType::DELETION_ORDER.len());
        for tracker_type in TrackerType::DELETION_ORDER {
            plan.push((tracker_type, bundle.uids(tracker_type, preheat)?));
        }

        self.in_transaction(&bundle.params.user, |service| {
            for (tracker_type, uids) in &plan {
                match tracker_type {
                    TrackerType::Relationship => service.delete_relationships(uids)?,
                    TrackerType::TrackerEvent | TrackerType::SingleEvent => service.delete_events(uids)?,
                    TrackerType::Enrollment => service.delete_enrollments(uids)?,
                    TrackerType::TrackedEntity => service.delete_tracked_entities(uids)?,
                }
            }
            Ok(())
        })
    }

    fn in_transaction<F>(&mut self, user: &UserInfo, run: F) -> ImportResult<DeletionReport>
    where
        F: FnOnce(&mut DeletionService<'_>) -> ImportResult<()>,
    {
        self.store.begin()?;
        let mut service = DeletionService::new(&mut self.store, user, Utc::now());
        let outcome = run(&mut service);
        let report = service.into_report();

        match outcome.and_then(|()| Ok(self.store.commit()?)) {
            Ok(()) => {
                info!(deleted = report.sequence.len(), "tracker deletion committed");
                Ok(report)
            }
            Err(err) => {
                if let Err(rollback) = self.store.rollback() {
                    error!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Runs every kind in commit order, then re-stamps touched tracked entities.
fn persist_bundle(
    ctx: &mut PersistContext<'_>,
    bundle: &TrackerBundle,
) -> ImportResult<BTreeMap<TrackerType, TypeReport>> {
    let mut reports = BTreeMap::new();
    for tracker_type in TrackerType::COMMIT_ORDER {
        let report = match tracker_type {
            TrackerType::TrackedEntity => {
                BundleRunner::run(&TrackedEntityPersister, &bundle.tracked_entities, ctx)?
            }
            TrackerType::Enrollment => {
                BundleRunner::run(&EnrollmentPersister, &bundle.enrollments, ctx)?
            }
            TrackerType::TrackerEvent => {
                BundleRunner::run(&TrackerEventPersister, &bundle.tracker_events, ctx)?
            }
            TrackerType::SingleEvent => {
                BundleRunner::run(&SingleEventPersister, &bundle.single_events, ctx)?
            }
            TrackerType::Relationship => {
                BundleRunner::run(&RelationshipPersister, &bundle.relationships, ctx)?
            }
        };
        reports.insert(tracker_type, report);
    }

    restamp_touched(ctx)?;
    Ok(reports)
}

/// Moves the last-updated stamp of every tracked entity whose children or
/// relationships changed in this run.
fn restamp_touched(ctx: &mut PersistContext<'_>) -> ImportResult<()> {
    let touched: BTreeSet<Uid> = ctx.touched.drain(..).collect();
    for uid in touched {
        let current = match ctx.preheat.tracked_entity(&uid) {
            Some(te) => Some(te.clone()),
            None => match ctx.store.get(TrackerType::TrackedEntity, &uid)? {
                Some(TrackerEntity::TrackedEntity(te)) => Some(te),
                _ => None,
            },
        };
        let Some(mut te) = current else {
            continue;
        };
        if te.deleted {
            continue;
        }
        te.audit.touch(&ctx.params.user, ctx.now);
        let entity = TrackerEntity::TrackedEntity(te);
        ctx.store.update(&entity)?;
        ctx.preheat.put(entity);
    }
    Ok(())
}
