//! Mapping from import payloads to persisted entities.

use chrono::{DateTime, Utc};
use tracker_model::{
    AuditInfo, Enrollment, Note, Relationship, SingleEvent, TrackedEntity, TrackerEvent, UserInfo,
    dto,
};
use tracker_types::{EnrollmentStatus, EventStatus, Uid};

use crate::{ImportResult, Preheat};

/// Converts validated payloads into the entities the persisters store.
///
/// The existing version of an object, if any, is looked up in the preheat.
/// Implementations must carry over the stored value rows of an existing
/// object unchanged; the value handler reconciles them afterwards.
pub trait TrackerConverter {
    fn tracked_entity(
        &self,
        dto: &dto::TrackedEntity,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<TrackedEntity>;

    fn enrollment(
        &self,
        dto: &dto::Enrollment,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<Enrollment>;

    fn tracker_event(
        &self,
        dto: &dto::TrackerEvent,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<TrackerEvent>;

    fn single_event(
        &self,
        dto: &dto::SingleEvent,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<SingleEvent>;

    fn relationship(
        &self,
        dto: &dto::Relationship,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<Relationship>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

fn stamp(existing: Option<&AuditInfo>, user: &UserInfo, now: DateTime<Utc>) -> AuditInfo {
    match existing {
        Some(audit) => {
            let mut audit = audit.clone();
            audit.touch(user, now);
            audit
        }
        None => AuditInfo::new(user, now),
    }
}

/// Existing notes plus the submitted ones not yet known. Notes are never
/// edited or removed.
fn merge_notes(
    existing: Option<&[Note]>,
    submitted: &[dto::Note],
    preheat: &Preheat,
    user: &UserInfo,
    now: DateTime<Utc>,
) -> Vec<Note> {
    let mut notes = existing.map(<[Note]>::to_vec).unwrap_or_default();
    for note in submitted {
        if preheat.has_note(&note.uid) || notes.iter().any(|n| n.uid == note.uid) {
            continue;
        }
        notes.push(Note {
            uid: note.uid,
            value: note.value.clone(),
            created_by: user.clone(),
            created: now,
        });
    }
    notes
}

/// Keeps the completion date while an object stays completed and sets it
/// when the object becomes completed.
fn completed_at(
    completed: bool,
    was_completed: bool,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (completed, was_completed) {
        (true, true) => previous.or(Some(now)),
        (true, false) => Some(now),
        (false, _) => None,
    }
}

impl TrackerConverter for DefaultConverter {
    fn tracked_entity(
        &self,
        dto: &dto::TrackedEntity,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<TrackedEntity> {
        let existing = preheat.tracked_entity(&dto.uid);
        Ok(TrackedEntity {
            uid: dto.uid,
            tracked_entity_type: dto.tracked_entity_type,
            org_unit: dto.org_unit,
            attribute_values: existing
                .map(|te| te.attribute_values.clone())
                .unwrap_or_default(),
            deleted: false,
            audit: stamp(existing.map(|te| &te.audit), user, now),
        })
    }

    fn enrollment(
        &self,
        dto: &dto::Enrollment,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<Enrollment> {
        let existing = preheat.enrollment(&dto.uid);
        let was_completed = existing.is_some_and(|e| e.status == EnrollmentStatus::Completed);
        Ok(Enrollment {
            uid: dto.uid,
            tracked_entity: dto.tracked_entity,
            program: dto.program,
            org_unit: dto.org_unit,
            status: dto.status,
            enrolled_at: dto.enrolled_at,
            completed_at: completed_at(
                dto.status == EnrollmentStatus::Completed,
                was_completed,
                existing.and_then(|e| e.completed_at),
                now,
            ),
            notes: merge_notes(existing.map(|e| e.notes.as_slice()), &dto.notes, preheat, user, now),
            deleted: false,
            audit: stamp(existing.map(|e| &e.audit), user, now),
        })
    }

    fn tracker_event(
        &self,
        dto: &dto::TrackerEvent,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<TrackerEvent> {
        let existing = preheat.tracker_event(&dto.uid);
        let was_completed = existing.is_some_and(|e| e.status == EventStatus::Completed);
        Ok(TrackerEvent {
            uid: dto.uid,
            enrollment: dto.enrollment,
            program_stage: dto.program_stage,
            org_unit: dto.org_unit,
            status: dto.status,
            occurred_at: dto.occurred_at,
            completed_at: completed_at(
                dto.status == EventStatus::Completed,
                was_completed,
                existing.and_then(|e| e.completed_at),
                now,
            ),
            data_values: existing
                .map(|e| e.data_values.clone())
                .unwrap_or_default(),
            notes: merge_notes(existing.map(|e| e.notes.as_slice()), &dto.notes, preheat, user, now),
            deleted: false,
            audit: stamp(existing.map(|e| &e.audit), user, now),
        })
    }

    fn single_event(
        &self,
        dto: &dto::SingleEvent,
        preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<SingleEvent> {
        let existing = preheat.single_event(&dto.uid);
        let was_completed = existing.is_some_and(|e| e.status == EventStatus::Completed);
        Ok(SingleEvent {
            uid: dto.uid,
            program_stage: dto.program_stage,
            org_unit: dto.org_unit,
            status: dto.status,
            occurred_at: dto.occurred_at,
            completed_at: completed_at(
                dto.status == EventStatus::Completed,
                was_completed,
                existing.and_then(|e| e.completed_at),
                now,
            ),
            data_values: existing
                .map(|e| e.data_values.clone())
                .unwrap_or_default(),
            notes: merge_notes(existing.map(|e| e.notes.as_slice()), &dto.notes, preheat, user, now),
            deleted: false,
            audit: stamp(existing.map(|e| &e.audit), user, now),
        })
    }

    fn relationship(
        &self,
        dto: &dto::Relationship,
        _preheat: &Preheat,
        user: &UserInfo,
        now: DateTime<Utc>,
    ) -> ImportResult<Relationship> {
        Ok(Relationship {
            uid: dto.uid.unwrap_or_else(Uid::generate),
            relationship_type: dto.relationship_type,
            from: dto.from,
            to: dto.to,
            deleted: false,
            audit: AuditInfo::new(user, now),
        })
    }
}
