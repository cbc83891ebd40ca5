//! Cascading deletion of tracked entities, enrollments, events and
//! relationships.
//!
//! Storage never cascades, so the order is enforced here: a row is deleted
//! only after every child and every relationship touching it. All five kinds
//! are soft-deleted. Attribute values, change logs and pending notification
//! instances are removed outright.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};
use tracker_model::{
    Enrollment, RelationshipItem, SingleEvent, TrackedEntity, TrackerEntity, TrackerEvent, UserInfo,
};
use tracker_storage::TrackerStore;
use tracker_types::{TrackerType, Uid};

use crate::report::{DeletionReport, Outcome};
use crate::{ImportError, ImportResult};

/// Deletes tracker objects inside a transaction the caller owns.
///
/// Every entry point fails on the first uid that was never stored. A uid
/// listed twice in one call is processed once; a row already deleted before
/// the call is reported as ignored and left untouched.
pub struct DeletionService<'a> {
    store: &'a mut dyn TrackerStore,
    user: &'a UserInfo,
    now: DateTime<Utc>,
    report: DeletionReport,
    seen: BTreeSet<(TrackerType, Uid)>,
}

enum AnyEvent {
    Tracker(TrackerEvent),
    Single(SingleEvent),
}

impl<'a> DeletionService<'a> {
    pub fn new(store: &'a mut dyn TrackerStore, user: &'a UserInfo, now: DateTime<Utc>) -> Self {
        Self {
            store,
            user,
            now,
            report: DeletionReport::default(),
            seen: BTreeSet::new(),
        }
    }

    pub fn report(&self) -> &DeletionReport {
        &self.report
    }

    pub fn into_report(self) -> DeletionReport {
        self.report
    }

    // ── Entry points ─────────────────────────────────────────────

    pub fn delete_tracked_entities(&mut self, uids: &[Uid]) -> ImportResult<()> {
        for (index, uid) in uids.iter().enumerate() {
            if !self.first_visit(TrackerType::TrackedEntity, uid) {
                continue;
            }
            let te = self.load_tracked_entity(uid)?;
            if te.deleted {
                self.already_deleted(TrackerType::TrackedEntity, index, *uid);
                continue;
            }
            self.delete_tracked_entity(index, te)?;
        }
        Ok(())
    }

    pub fn delete_enrollments(&mut self, uids: &[Uid]) -> ImportResult<()> {
        for (index, uid) in uids.iter().enumerate() {
            if !self.first_visit(TrackerType::Enrollment, uid) {
                continue;
            }
            let enrollment = self.load_enrollment(uid)?;
            if enrollment.deleted {
                self.already_deleted(TrackerType::Enrollment, index, *uid);
                continue;
            }
            let tracked_entity = enrollment.tracked_entity;
            self.delete_enrollment(index, enrollment)?;
            self.restamp(TrackerType::TrackedEntity, &tracked_entity)?;
        }
        Ok(())
    }

    /// Accepts uids of tracker events and single events alike.
    pub fn delete_events(&mut self, uids: &[Uid]) -> ImportResult<()> {
        for (index, uid) in uids.iter().enumerate() {
            match self.load_event(uid)? {
                AnyEvent::Tracker(event) => {
                    if !self.first_visit(TrackerType::TrackerEvent, uid) {
                        continue;
                    }
                    if event.deleted {
                        self.already_deleted(TrackerType::TrackerEvent, index, *uid);
                        continue;
                    }
                    let enrollment = event.enrollment;
                    self.delete_tracker_event(index, event)?;
                    self.restamp_enrollment_chain(&enrollment)?;
                }
                AnyEvent::Single(event) => {
                    if !self.first_visit(TrackerType::SingleEvent, uid) {
                        continue;
                    }
                    if event.deleted {
                        self.already_deleted(TrackerType::SingleEvent, index, *uid);
                        continue;
                    }
                    self.delete_single_event(index, event)?;
                }
            }
        }
        Ok(())
    }

    pub fn delete_relationships(&mut self, uids: &[Uid]) -> ImportResult<()> {
        for (index, uid) in uids.iter().enumerate() {
            if !self.first_visit(TrackerType::Relationship, uid) {
                continue;
            }
            match self.store.get(TrackerType::Relationship, uid)? {
                Some(relationship) if relationship.is_deleted() => {
                    self.already_deleted(TrackerType::Relationship, index, *uid);
                }
                Some(_) => self.delete_relationship(index, *uid)?,
                None => return Err(not_found(TrackerType::Relationship, uid)),
            }
        }
        Ok(())
    }

    // ── Cascades ─────────────────────────────────────────────────

    fn delete_tracked_entity(&mut self, index: usize, mut te: TrackedEntity) -> ImportResult<()> {
        te.audit.touch(self.user, self.now);

        for enrollment in self.store.enrollments_of(&te.uid)? {
            if !enrollment.deleted && self.first_visit(TrackerType::Enrollment, &enrollment.uid) {
                self.delete_enrollment(index, enrollment)?;
            }
        }
        self.delete_relationships_touching(index, RelationshipItem::TrackedEntity(te.uid))?;

        let removed = self.store.delete_attribute_values(&te.uid)?;
        let logs = self
            .store
            .delete_change_logs(TrackerType::TrackedEntity, &te.uid)?;
        debug!(uid = %te.uid, values = removed.len(), change_logs = logs, "removed attribute values");

        self.soft_delete(TrackerEntity::TrackedEntity(te), index)
    }

    fn delete_enrollment(&mut self, index: usize, mut enrollment: Enrollment) -> ImportResult<()> {
        enrollment.audit.touch(self.user, self.now);

        for event in self.store.events_of(&enrollment.uid)? {
            if !event.deleted && self.first_visit(TrackerType::TrackerEvent, &event.uid) {
                self.delete_tracker_event(index, event)?;
            }
        }
        self.delete_relationships_touching(index, RelationshipItem::Enrollment(enrollment.uid))?;
        self.store
            .delete_notification_instances(TrackerType::Enrollment, &enrollment.uid)?;

        self.soft_delete(TrackerEntity::Enrollment(enrollment), index)
    }

    fn delete_tracker_event(&mut self, index: usize, mut event: TrackerEvent) -> ImportResult<()> {
        event.audit.touch(self.user, self.now);
        self.delete_relationships_touching(index, RelationshipItem::Event(event.uid))?;
        self.store
            .delete_change_logs(TrackerType::TrackerEvent, &event.uid)?;
        self.store
            .delete_notification_instances(TrackerType::TrackerEvent, &event.uid)?;
        self.soft_delete(TrackerEntity::TrackerEvent(event), index)
    }

    fn delete_single_event(&mut self, index: usize, mut event: SingleEvent) -> ImportResult<()> {
        event.audit.touch(self.user, self.now);
        self.delete_relationships_touching(index, RelationshipItem::Event(event.uid))?;
        self.store
            .delete_change_logs(TrackerType::SingleEvent, &event.uid)?;
        self.store
            .delete_notification_instances(TrackerType::SingleEvent, &event.uid)?;
        self.soft_delete(TrackerEntity::SingleEvent(event), index)
    }

    fn delete_relationships_touching(&mut self, index: usize, item: RelationshipItem) -> ImportResult<()> {
        for relationship in self.store.relationships_touching(&item)? {
            if self.first_visit(TrackerType::Relationship, &relationship.uid) {
                self.delete_relationship(index, relationship.uid)?;
            }
        }
        Ok(())
    }

    fn delete_relationship(&mut self, index: usize, uid: Uid) -> ImportResult<()> {
        self.store.soft_delete(TrackerType::Relationship, &uid)?;
        self.report
            .record(TrackerType::Relationship, index, uid, Outcome::Deleted, None);
        debug!(%uid, "deleted relationship");
        Ok(())
    }

    /// Saves the stamped row, flags it deleted and records it.
    fn soft_delete(&mut self, entity: TrackerEntity, index: usize) -> ImportResult<()> {
        let (tracker_type, uid) = (entity.tracker_type(), entity.uid());
        self.store.update(&entity)?;
        self.store.soft_delete(tracker_type, &uid)?;
        self.report
            .record(tracker_type, index, uid, Outcome::Deleted, None);
        debug!(%tracker_type, %uid, "deleted");
        Ok(())
    }

    // ── Parents ──────────────────────────────────────────────────

    /// Moves the last-updated stamp of a surviving parent.
    fn restamp(&mut self, tracker_type: TrackerType, uid: &Uid) -> ImportResult<()> {
        let Some(mut parent) = self.store.get(tracker_type, uid)? else {
            return Err(not_found(tracker_type, uid));
        };
        if parent.is_deleted() {
            return Ok(());
        }
        parent.audit_mut().touch(self.user, self.now);
        self.store.update(&parent)?;
        Ok(())
    }

    fn restamp_enrollment_chain(&mut self, enrollment: &Uid) -> ImportResult<()> {
        let tracked_entity = self.load_enrollment(enrollment)?.tracked_entity;
        self.restamp(TrackerType::Enrollment, enrollment)?;
        self.restamp(TrackerType::TrackedEntity, &tracked_entity)
    }

    // ── Lookups ──────────────────────────────────────────────────

    fn load_tracked_entity(&self, uid: &Uid) -> ImportResult<TrackedEntity> {
        match self.store.get(TrackerType::TrackedEntity, uid)? {
            Some(TrackerEntity::TrackedEntity(te)) => Ok(te),
            _ => Err(not_found(TrackerType::TrackedEntity, uid)),
        }
    }

    fn load_enrollment(&self, uid: &Uid) -> ImportResult<Enrollment> {
        match self.store.get(TrackerType::Enrollment, uid)? {
            Some(TrackerEntity::Enrollment(enrollment)) => Ok(enrollment),
            _ => Err(not_found(TrackerType::Enrollment, uid)),
        }
    }

    fn load_event(&self, uid: &Uid) -> ImportResult<AnyEvent> {
        if let Some(TrackerEntity::TrackerEvent(event)) = self.store.get(TrackerType::TrackerEvent, uid)? {
            return Ok(AnyEvent::Tracker(event));
        }
        match self.store.get(TrackerType::SingleEvent, uid)? {
            Some(TrackerEntity::SingleEvent(event)) => Ok(AnyEvent::Single(event)),
            _ => Err(not_found(TrackerType::TrackerEvent, uid)),
        }
    }

    fn first_visit(&mut self, tracker_type: TrackerType, uid: &Uid) -> bool {
        self.seen.insert((tracker_type, *uid))
    }

    fn already_deleted(&mut self, tracker_type: TrackerType, index: usize, uid: Uid) {
        info!(%tracker_type, %uid, "already deleted");
        self.report.record(
            tracker_type,
            index,
            uid,
            Outcome::Ignored,
            Some("already deleted".to_string()),
        );
    }
}

fn not_found(tracker_type: TrackerType, uid: &Uid) -> ImportError {
    ImportError::NotFound {
        tracker_type,
        uid: *uid,
    }
}
