use tracker_model::{Relationship, dto};
use tracker_types::{TrackerType, Uid};

use crate::{ImportResult, PersistContext, Persister, Preheat};

/// Persists relationships. A relationship is never updated: resubmitting an
/// existing one is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipPersister;

impl Persister for RelationshipPersister {
    type Dto = dto::Relationship;
    type Entity = Relationship;

    const TRACKER_TYPE: TrackerType = TrackerType::Relationship;

    fn dto_uid(&self, dto: &dto::Relationship) -> Option<Uid> {
        dto.uid
    }

    fn entity_uid(&self, entity: &Relationship) -> Uid {
        entity.uid
    }

    fn convert(&self, ctx: &PersistContext<'_>, dto: &dto::Relationship) -> ImportResult<Relationship> {
        ctx.converter.relationship(dto, ctx.preheat, ctx.user(), ctx.now)
    }

    /// Decided on the structural key, not the uid: the same link may be
    /// submitted again without one.
    fn is_new(&self, preheat: &Preheat, entity: &Relationship) -> ImportResult<bool> {
        let bidirectional = preheat
            .relationship_type(&entity.relationship_type)?
            .bidirectional;
        Ok(!preheat.exists(TrackerType::Relationship, &entity.uid)
            && !preheat.is_duplicate(&entity.key(), bidirectional))
    }

    fn is_updatable(&self) -> bool {
        false
    }

    fn touched_tracked_entities(
        &self,
        preheat: &Preheat,
        entity: &Relationship,
        is_new: bool,
    ) -> ImportResult<Vec<Uid>> {
        if !is_new {
            return Ok(Vec::new());
        }
        let bidirectional = preheat
            .relationship_type(&entity.relationship_type)?
            .bidirectional;
        let mut touched: Vec<Uid> = entity.from.tracked_entity().into_iter().collect();
        if bidirectional {
            touched.extend(entity.to.tracked_entity());
        }
        Ok(touched)
    }
}
