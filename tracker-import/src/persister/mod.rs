//! Persisters: one per tracker kind, driven by [`BundleRunner`](crate::BundleRunner).
//!
//! Every kind goes through the same steps (convert, decide new vs existing,
//! insert or merge, apply values, write back to the preheat). A persister
//! only supplies the kind-specific hooks.

mod enrollment;
mod event;
mod relationship;
mod tracked_entity;

pub use enrollment::EnrollmentPersister;
pub use event::{SingleEventPersister, TrackerEventPersister};
pub use relationship::RelationshipPersister;
pub use tracked_entity::TrackedEntityPersister;

use tracker_model::TrackerEntity;
use tracker_types::{EventStatus, TrackerType, Uid};

use crate::{ImportResult, NotificationTrigger, PersistContext, Preheat};

/// Kind-specific hooks of the persist algorithm.
pub trait Persister {
    type Dto;
    type Entity: Clone + Into<TrackerEntity>;

    const TRACKER_TYPE: TrackerType;

    /// The uid a payload was submitted with, if any.
    fn dto_uid(&self, dto: &Self::Dto) -> Option<Uid>;

    fn entity_uid(&self, entity: &Self::Entity) -> Uid;

    /// Notification triggers implied by the payload compared to the preheat.
    fn triggers(&self, _dto: &Self::Dto, _preheat: &Preheat) -> Vec<NotificationTrigger> {
        Vec::new()
    }

    fn convert(&self, ctx: &PersistContext<'_>, dto: &Self::Dto) -> ImportResult<Self::Entity>;

    /// Creates ownership records the entity implies.
    fn persist_ownership(&self, _ctx: &mut PersistContext<'_>, _entity: &Self::Entity) -> ImportResult<()> {
        Ok(())
    }

    fn is_new(&self, preheat: &Preheat, entity: &Self::Entity) -> ImportResult<bool>;

    /// Whether an existing entity of this kind may be merged.
    fn is_updatable(&self) -> bool {
        true
    }

    /// Reconciles the values the payload carries.
    fn apply_values(
        &self,
        _ctx: &mut PersistContext<'_>,
        _dto: &Self::Dto,
        _entity: &mut Self::Entity,
    ) -> ImportResult<()> {
        Ok(())
    }

    fn update_preheat(&self, preheat: &mut Preheat, entity: &Self::Entity) {
        preheat.put(entity.clone().into());
    }

    /// Tracked entities whose last-updated stamp must move because of this
    /// entity.
    fn touched_tracked_entities(
        &self,
        _preheat: &Preheat,
        _entity: &Self::Entity,
        _is_new: bool,
    ) -> ImportResult<Vec<Uid>> {
        Ok(Vec::new())
    }
}

/// An event completes when its status moves into COMPLETED, including an
/// event created already completed.
pub(crate) fn completion_triggers(
    previous: Option<EventStatus>,
    status: EventStatus,
) -> Vec<NotificationTrigger> {
    if status == EventStatus::Completed && previous != Some(EventStatus::Completed) {
        vec![NotificationTrigger::EventCompletion]
    } else {
        Vec::new()
    }
}
