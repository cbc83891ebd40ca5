//! Per-run cache of existing tracker state and referenced metadata.
//!
//! The caller fills a [`Preheat`] before a run. Persisters answer "does this
//! already exist" from it and write every persisted object back into it, so a
//! later object in the same run (an event under an enrollment persisted
//! moments earlier) resolves without a storage round-trip.
//!
//! A best-effort run wraps each object in a journal: every mutation records
//! how to undo itself, and a failed object rolls the cache back exactly.

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;
use tracker_model::{
    DataElement, Enrollment, Ownership, Program, ProgramStage, Relationship, RelationshipKey,
    RelationshipType, SingleEvent, TrackedEntity, TrackedEntityAttribute, TrackedEntityType,
    TrackerEntity, TrackerEvent,
};
use tracker_types::{TrackerType, Uid};

use crate::{ImportError, ImportResult};

#[derive(Debug)]
enum Undo {
    Entity {
        tracker_type: TrackerType,
        uid: Uid,
        previous: Option<TrackerEntity>,
    },
    RelationshipKey {
        key: RelationshipKey,
        previous: Option<Uid>,
    },
    Ownership {
        key: (Uid, Uid),
    },
    Note {
        uid: Uid,
    },
}

/// Existing-state cache for one run. Not shared between runs or threads.
#[derive(Debug, Default)]
pub struct Preheat {
    entities: BTreeMap<(TrackerType, Uid), TrackerEntity>,
    relationship_keys: BTreeMap<RelationshipKey, Uid>,
    ownerships: BTreeMap<(Uid, Uid), Ownership>,
    notes: BTreeSet<Uid>,

    tracked_entity_types: BTreeMap<Uid, TrackedEntityType>,
    programs: BTreeMap<Uid, Program>,
    program_stages: BTreeMap<Uid, ProgramStage>,
    attributes: BTreeMap<Uid, TrackedEntityAttribute>,
    data_elements: BTreeMap<Uid, DataElement>,
    relationship_types: BTreeMap<Uid, RelationshipType>,

    journal: Option<Vec<Undo>>,
}

impl Preheat {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Entities ─────────────────────────────────────────────────

    pub fn get(&self, tracker_type: TrackerType, uid: &Uid) -> Option<&TrackerEntity> {
        self.entities.get(&(tracker_type, *uid))
    }

    pub fn exists(&self, tracker_type: TrackerType, uid: &Uid) -> bool {
        self.entities.contains_key(&(tracker_type, *uid))
    }

    /// Stores or replaces an entity. Relationships are also indexed by key and
    /// the notes of enrollments and events become known.
    pub fn put(&mut self, entity: TrackerEntity) {
        let tracker_type = entity.tracker_type();
        let uid = entity.uid();

        match &entity {
            TrackerEntity::Relationship(relationship) => {
                let key = relationship.key();
                let previous = self.relationship_keys.insert(key, uid);
                self.record(Undo::RelationshipKey { key, previous });
            }
            TrackerEntity::Enrollment(Enrollment { notes, .. })
            | TrackerEntity::TrackerEvent(TrackerEvent { notes, .. })
            | TrackerEntity::SingleEvent(SingleEvent { notes, .. }) => {
                let uids: Vec<Uid> = notes.iter().map(|n| n.uid).collect();
                for note in uids {
                    self.add_note(note);
                }
            }
            TrackerEntity::TrackedEntity(_) => {}
        }

        let previous = self.entities.insert((tracker_type, uid), entity);
        self.record(Undo::Entity {
            tracker_type,
            uid,
            previous,
        });
    }

    pub fn tracked_entity(&self, uid: &Uid) -> Option<&TrackedEntity> {
        match self.get(TrackerType::TrackedEntity, uid) {
            Some(TrackerEntity::TrackedEntity(te)) => Some(te),
            _ => None,
        }
    }

    pub fn enrollment(&self, uid: &Uid) -> Option<&Enrollment> {
        match self.get(TrackerType::Enrollment, uid) {
            Some(TrackerEntity::Enrollment(enrollment)) => Some(enrollment),
            _ => None,
        }
    }

    pub fn tracker_event(&self, uid: &Uid) -> Option<&TrackerEvent> {
        match self.get(TrackerType::TrackerEvent, uid) {
            Some(TrackerEntity::TrackerEvent(event)) => Some(event),
            _ => None,
        }
    }

    pub fn single_event(&self, uid: &Uid) -> Option<&SingleEvent> {
        match self.get(TrackerType::SingleEvent, uid) {
            Some(TrackerEntity::SingleEvent(event)) => Some(event),
            _ => None,
        }
    }

    pub fn relationship(&self, uid: &Uid) -> Option<&Relationship> {
        match self.get(TrackerType::Relationship, uid) {
            Some(TrackerEntity::Relationship(relationship)) => Some(relationship),
            _ => None,
        }
    }

    // ── Relationship keys ────────────────────────────────────────

    /// Registers a relationship known to exist in storage, by key only.
    pub fn add_existing_relationship(&mut self, key: RelationshipKey, uid: Uid) {
        let previous = self.relationship_keys.insert(key, uid);
        self.record(Undo::RelationshipKey { key, previous });
    }

    /// The uid of the stored relationship matching `key`, reading a
    /// bidirectional type from either side.
    pub fn relationship_uid(&self, key: &RelationshipKey, bidirectional: bool) -> Option<Uid> {
        self.relationship_keys.get(key).copied().or_else(|| {
            if bidirectional {
                self.relationship_keys.get(&key.inverse()).copied()
            } else {
                None
            }
        })
    }

    /// Whether a relationship with this key already exists.
    pub fn is_duplicate(&self, key: &RelationshipKey, bidirectional: bool) -> bool {
        self.relationship_uid(key, bidirectional).is_some()
    }

    // ── Ownership ────────────────────────────────────────────────

    pub fn ownership(&self, tracked_entity: &Uid, program: &Uid) -> Option<&Ownership> {
        self.ownerships.get(&(*tracked_entity, *program))
    }

    /// Records the owner of a (tracked entity, program) pair. An existing
    /// ownership is kept.
    pub fn add_ownership(&mut self, tracked_entity: Uid, program: Uid, org_unit: Uid) {
        let key = (tracked_entity, program);
        if self.ownerships.contains_key(&key) {
            return;
        }
        self.ownerships.insert(
            key,
            Ownership {
                tracked_entity,
                program,
                org_unit,
            },
        );
        self.record(Undo::Ownership { key });
    }

    // ── Notes ────────────────────────────────────────────────────

    pub fn add_note(&mut self, uid: Uid) {
        if self.notes.insert(uid) {
            self.record(Undo::Note { uid });
        }
    }

    pub fn has_note(&self, uid: &Uid) -> bool {
        self.notes.contains(uid)
    }

    // ── Metadata ─────────────────────────────────────────────────

    pub fn add_tracked_entity_type(&mut self, value: TrackedEntityType) {
        self.tracked_entity_types.insert(value.uid, value);
    }

    pub fn add_program(&mut self, value: Program) {
        self.programs.insert(value.uid, value);
    }

    pub fn add_program_stage(&mut self, value: ProgramStage) {
        self.program_stages.insert(value.uid, value);
    }

    pub fn add_attribute(&mut self, value: TrackedEntityAttribute) {
        self.attributes.insert(value.uid, value);
    }

    pub fn add_data_element(&mut self, value: DataElement) {
        self.data_elements.insert(value.uid, value);
    }

    pub fn add_relationship_type(&mut self, value: RelationshipType) {
        self.relationship_types.insert(value.uid, value);
    }

    pub fn tracked_entity_type(&self, uid: &Uid) -> ImportResult<&TrackedEntityType> {
        self.tracked_entity_types
            .get(uid)
            .ok_or(ImportError::MissingMetadata {
                kind: "tracked entity type",
                uid: *uid,
            })
    }

    pub fn program(&self, uid: &Uid) -> ImportResult<&Program> {
        self.programs.get(uid).ok_or(ImportError::MissingMetadata {
            kind: "program",
            uid: *uid,
        })
    }

    pub fn program_stage(&self, uid: &Uid) -> ImportResult<&ProgramStage> {
        self.program_stages
            .get(uid)
            .ok_or(ImportError::MissingMetadata {
                kind: "program stage",
                uid: *uid,
            })
    }

    pub fn attribute(&self, uid: &Uid) -> ImportResult<&TrackedEntityAttribute> {
        self.attributes.get(uid).ok_or(ImportError::MissingMetadata {
            kind: "attribute",
            uid: *uid,
        })
    }

    pub fn data_element(&self, uid: &Uid) -> ImportResult<&DataElement> {
        self.data_elements
            .get(uid)
            .ok_or(ImportError::MissingMetadata {
                kind: "data element",
                uid: *uid,
            })
    }

    pub fn relationship_type(&self, uid: &Uid) -> ImportResult<&RelationshipType> {
        self.relationship_types
            .get(uid)
            .ok_or(ImportError::MissingMetadata {
                kind: "relationship type",
                uid: *uid,
            })
    }

    /// The program an event's stage belongs to.
    pub fn program_of_stage(&self, stage: &Uid) -> ImportResult<&Program> {
        let program = self.program_stage(stage)?.program;
        self.program(&program)
    }

    // ── Journal ──────────────────────────────────────────────────

    /// Starts recording undo steps for the mutations that follow.
    pub fn begin_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keeps every mutation since [`Self::begin_journal`].
    pub fn commit_journal(&mut self) {
        self.journal = None;
    }

    /// Reverts every mutation since [`Self::begin_journal`], newest first.
    pub fn rollback_journal(&mut self) {
        let Some(steps) = self.journal.take() else {
            return;
        };
        trace!(steps = steps.len(), "rolling back preheat journal");
        for step in steps.into_iter().rev() {
            match step {
                Undo::Entity {
                    tracker_type,
                    uid,
                    previous,
                } => match previous {
                    Some(entity) => {
                        self.entities.insert((tracker_type, uid), entity);
                    }
                    None => {
                        self.entities.remove(&(tracker_type, uid));
                    }
                },
                Undo::RelationshipKey { key, previous } => match previous {
                    Some(uid) => {
                        self.relationship_keys.insert(key, uid);
                    }
                    None => {
                        self.relationship_keys.remove(&key);
                    }
                },
                Undo::Ownership { key } => {
                    self.ownerships.remove(&key);
                }
                Undo::Note { uid } => {
                    self.notes.remove(&uid);
                }
            }
        }
    }

    fn record(&mut self, step: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(step);
        }
    }
}
