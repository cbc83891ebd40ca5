use tracing::debug;
use tracker_model::{Enrollment, Ownership, dto};
use tracker_types::{TrackerType, Uid};

use crate::differ::diff;
use crate::value_handler::{AttributeTable, ValueOwner, apply_changes, current_values};
use crate::{ImportError, ImportResult, PersistContext, Persister, Preheat};

/// Persists enrollments, their program ownership and the program attributes
/// they carry for their tracked entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentPersister;

impl Persister for EnrollmentPersister {
    type Dto = dto::Enrollment;
    type Entity = Enrollment;

    const TRACKER_TYPE: TrackerType = TrackerType::Enrollment;

    fn dto_uid(&self, dto: &dto::Enrollment) -> Option<Uid> {
        Some(dto.uid)
    }

    fn entity_uid(&self, entity: &Enrollment) -> Uid {
        entity.uid
    }

    fn convert(&self, ctx: &PersistContext<'_>, dto: &dto::Enrollment) -> ImportResult<Enrollment> {
        ctx.converter.enrollment(dto, ctx.preheat, ctx.user(), ctx.now)
    }

    fn persist_ownership(&self, ctx: &mut PersistContext<'_>, entity: &Enrollment) -> ImportResult<()> {
        let (te, program) = (entity.tracked_entity, entity.program);
        if ctx.preheat.ownership(&te, &program).is_some() {
            return Ok(());
        }
        if let Some(stored) = ctx.store.ownership(&te, &program)? {
            ctx.preheat.add_ownership(te, program, stored.org_unit);
            return Ok(());
        }
        ctx.store.insert_ownership(&Ownership {
            tracked_entity: te,
            program,
            org_unit: entity.org_unit,
        })?;
        ctx.preheat.add_ownership(te, program, entity.org_unit);
        debug!(tracked_entity = %te, program = %program, "created program ownership");
        Ok(())
    }

    fn is_new(&self, preheat: &Preheat, entity: &Enrollment) -> ImportResult<bool> {
        Ok(!preheat.exists(TrackerType::Enrollment, &entity.uid))
    }

    /// Program attributes land on the tracked entity. Only the submitted keys
    /// are reconciled; other attributes of the tracked entity are left alone.
    fn apply_values(
        &self,
        ctx: &mut PersistContext<'_>,
        dto: &dto::Enrollment,
        entity: &mut Enrollment,
    ) -> ImportResult<()> {
        let submitted = dto::attribute_set(&dto.attributes);
        if submitted.is_empty() {
            return Ok(());
        }

        let mut te = ctx
            .preheat
            .tracked_entity(&entity.tracked_entity)
            .cloned()
            .ok_or(ImportError::NotFound {
                tracker_type: TrackerType::TrackedEntity,
                uid: entity.tracked_entity,
            })?;
        let audit = ctx
            .preheat
            .tracked_entity_type(&te.tracked_entity_type)?
            .allow_audit_log;

        let mut stored = current_values::<AttributeTable>(&te.attribute_values);
        stored.retain(|key, _| submitted.contains_key(key));
        let changes = diff(&stored, &submitted);
        if changes.is_empty() {
            return Ok(());
        }

        let owner = ValueOwner {
            tracker_type: TrackerType::TrackedEntity,
            uid: te.uid,
            audit,
        };
        apply_changes::<AttributeTable>(ctx, &owner, &mut te.attribute_values, &changes)?;
        ctx.touched.push(te.uid);
        ctx.preheat.put(te.into());
        Ok(())
    }

    fn touched_tracked_entities(
        &self,
        _preheat: &Preheat,
        entity: &Enrollment,
        is_new: bool,
    ) -> ImportResult<Vec<Uid>> {
        Ok(if is_new {
            Vec::new()
        } else {
            vec![entity.tracked_entity]
        })
    }
}
