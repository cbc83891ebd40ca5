use tracker_model::{TrackedEntity, dto};
use tracker_types::{TrackerType, Uid};

use crate::differ::diff;
use crate::value_handler::{AttributeTable, ValueOwner, apply_changes, current_values};
use crate::{ImportResult, PersistContext, Persister, Preheat};

/// Persists tracked entities and their attribute values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedEntityPersister;

impl Persister for TrackedEntityPersister {
    type Dto = dto::TrackedEntity;
    type Entity = TrackedEntity;

    const TRACKER_TYPE: TrackerType = TrackerType::TrackedEntity;

    fn dto_uid(&self, dto: &dto::TrackedEntity) -> Option<Uid> {
        Some(dto.uid)
    }

    fn entity_uid(&self, entity: &TrackedEntity) -> Uid {
        entity.uid
    }

    fn convert(&self, ctx: &PersistContext<'_>, dto: &dto::TrackedEntity) -> ImportResult<TrackedEntity> {
        ctx.converter.tracked_entity(dto, ctx.preheat, ctx.user(), ctx.now)
    }

    fn is_new(&self, preheat: &Preheat, entity: &TrackedEntity) -> ImportResult<bool> {
        Ok(!preheat.exists(TrackerType::TrackedEntity, &entity.uid))
    }

    fn apply_values(
        &self,
        ctx: &mut PersistContext<'_>,
        dto: &dto::TrackedEntity,
        entity: &mut TrackedEntity,
    ) -> ImportResult<()> {
        let audit = ctx
            .preheat
            .tracked_entity_type(&entity.tracked_entity_type)?
            .allow_audit_log;
        let changes = diff(
            &current_values::<AttributeTable>(&entity.attribute_values),
            &dto::attribute_set(&dto.attributes),
        );
        let owner = ValueOwner {
            tracker_type: TrackerType::TrackedEntity,
            uid: entity.uid,
            audit,
        };
        apply_changes::<AttributeTable>(ctx, &owner, &mut entity.attribute_values, &changes)
    }

    fn touched_tracked_entities(
        &self,
        _preheat: &Preheat,
        entity: &TrackedEntity,
        is_new: bool,
    ) -> ImportResult<Vec<Uid>> {
        Ok(if is_new { Vec::new() } else { vec![entity.uid] })
    }
}
