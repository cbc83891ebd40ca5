use tracker_model::{SingleEvent, TrackerEvent, dto};
use tracker_types::{TrackerType, Uid};

use super::completion_triggers;
use crate::differ::diff;
use crate::value_handler::{DataValueTable, ValueOwner, apply_changes, current_values};
use crate::{ImportResult, NotificationTrigger, PersistContext, Persister, Preheat};

/// Persists events recorded under an enrollment, with their data values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerEventPersister;

impl Persister for TrackerEventPersister {
    type Dto = dto::TrackerEvent;
    type Entity = TrackerEvent;

    const TRACKER_TYPE: TrackerType = TrackerType::TrackerEvent;

    fn dto_uid(&self, dto: &dto::TrackerEvent) -> Option<Uid> {
        Some(dto.uid)
    }

    fn entity_uid(&self, entity: &TrackerEvent) -> Uid {
        entity.uid
    }

    fn triggers(&self, dto: &dto::TrackerEvent, preheat: &Preheat) -> Vec<NotificationTrigger> {
        completion_triggers(preheat.tracker_event(&dto.uid).map(|e| e.status), dto.status)
    }

    fn convert(&self, ctx: &PersistContext<'_>, dto: &dto::TrackerEvent) -> ImportResult<TrackerEvent> {
        ctx.converter.tracker_event(dto, ctx.preheat, ctx.user(), ctx.now)
    }

    fn is_new(&self, preheat: &Preheat, entity: &TrackerEvent) -> ImportResult<bool> {
        Ok(!preheat.exists(TrackerType::TrackerEvent, &entity.uid))
    }

    fn apply_values(
        &self,
        ctx: &mut PersistContext<'_>,
        dto: &dto::TrackerEvent,
        entity: &mut TrackerEvent,
    ) -> ImportResult<()> {
        let audit = ctx
            .preheat
            .program_of_stage(&entity.program_stage)?
            .allow_audit_log;
        let changes = diff(
            &current_values::<DataValueTable>(&entity.data_values),
            &dto::data_value_set(&dto.data_values),
        );
        let owner = ValueOwner {
            tracker_type: TrackerType::TrackerEvent,
            uid: entity.uid,
            audit,
        };
        apply_changes::<DataValueTable>(ctx, &owner, &mut entity.data_values, &changes)
    }

    fn touched_tracked_entities(
        &self,
        preheat: &Preheat,
        entity: &TrackerEvent,
        is_new: bool,
    ) -> ImportResult<Vec<Uid>> {
        if is_new {
            return Ok(Vec::new());
        }
        Ok(preheat
            .enrollment(&entity.enrollment)
            .map(|e| e.tracked_entity)
            .into_iter()
            .collect())
    }
}

/// Persists events of programs without registration, with their data values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleEventPersister;

impl Persister for SingleEventPersister {
    type Dto = dto::SingleEvent;
    type Entity = SingleEvent;

    const TRACKER_TYPE: TrackerType = TrackerType::SingleEvent;

    fn dto_uid(&self, dto: &dto::SingleEvent) -> Option<Uid> {
        Some(dto.uid)
    }

    fn entity_uid(&self, entity: &SingleEvent) -> Uid {
        entity.uid
    }

    fn triggers(&self, dto: &dto::SingleEvent, preheat: &Preheat) -> Vec<NotificationTrigger> {
        completion_triggers(preheat.single_event(&dto.uid).map(|e| e.status), dto.status)
    }

    fn convert(&self, ctx: &PersistContext<'_>, dto: &dto::SingleEvent) -> ImportResult<SingleEvent> {
        ctx.converter.single_event(dto, ctx.preheat, ctx.user(), ctx.now)
    }

    fn is_new(&self, preheat: &Preheat, entity: &SingleEvent) -> ImportResult<bool> {
        Ok(!preheat.exists(TrackerType::SingleEvent, &entity.uid))
    }

    fn apply_values(
        &self,
        ctx: &mut PersistContext<'_>,
        dto: &dto::SingleEvent,
        entity: &mut SingleEvent,
    ) -> ImportResult<()> {
        let audit = ctx
            .preheat
            .program_of_stage(&entity.program_stage)?
            .allow_audit_log;
        let changes = diff(
            &current_values::<DataValueTable>(&entity.data_values),
            &dto::data_value_set(&dto.data_values),
        );
        let owner = ValueOwner {
            tracker_type: TrackerType::SingleEvent,
            uid: entity.uid,
            audit,
        };
        apply_changes::<DataValueTable>(ctx, &owner, &mut entity.data_values, &changes)
    }
}
