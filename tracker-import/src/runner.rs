//! Drives one persister over the payloads of one kind.

use tracing::{debug, warn};
use tracker_types::{AtomicMode, Uid};

use crate::report::{Outcome, TypeReport};
use crate::{ImportError, ImportResult, NotificationDescriptor, PersistContext, Persister};

/// Runs a [`Persister`] over a list of payloads and reports the outcomes.
///
/// Under [`AtomicMode::All`] the first failure aborts the run and the caller
/// is expected to roll back the transaction. Under [`AtomicMode::Object`]
/// each object runs inside a savepoint and a preheat journal; a failing
/// object is undone, counted as ignored, and the run continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleRunner;

impl BundleRunner {
    pub fn run<P: Persister>(
        persister: &P,
        dtos: &[P::Dto],
        ctx: &mut PersistContext<'_>,
    ) -> ImportResult<TypeReport> {
        let mut report = TypeReport::new(P::TRACKER_TYPE);
        let best_effort = ctx.params.atomic_mode == AtomicMode::Object;

        for (index, dto) in dtos.iter().enumerate() {
            if !best_effort {
                match persist_one(persister, dto, ctx) {
                    Ok((uid, outcome)) => report.record(index, Some(uid), outcome, None),
                    Err(source) => {
                        return Err(ImportError::Persistence {
                            tracker_type: P::TRACKER_TYPE,
                            uid: persister.dto_uid(dto),
                            source: Box::new(source),
                        });
                    }
                }
                continue;
            }

            let savepoint = ctx.store.savepoint()?;
            ctx.preheat.begin_journal();
            let notifications = ctx.notifications.len();
            let touched = ctx.touched.len();
            let used_values = ctx.used_values.len();

            match persist_one(persister, dto, ctx) {
                Ok((uid, outcome)) => {
                    ctx.store.release_savepoint(savepoint)?;
                    ctx.preheat.commit_journal();
                    report.record(index, Some(uid), outcome, None);
                }
                Err(err) => {
                    ctx.store.rollback_to_savepoint(savepoint)?;
                    ctx.store.release_savepoint(savepoint)?;
                    ctx.preheat.rollback_journal();
                    ctx.notifications.truncate(notifications);
                    ctx.touched.truncate(touched);
                    ctx.used_values.truncate(used_values);
                    let uid = persister.dto_uid(dto);
                    warn!(
                        tracker_type = %P::TRACKER_TYPE,
                        index,
                        uid = ?uid,
                        error = %err,
                        "object ignored"
                    );
                    report.record(index, uid, Outcome::Ignored, Some(err.to_string()));
                }
            }
        }

        debug!(
            tracker_type = %P::TRACKER_TYPE,
            created = report.stats.created,
            updated = report.stats.updated,
            ignored = report.stats.ignored,
            "type run finished"
        );
        Ok(report)
    }
}

/// Persists one payload. Returns the uid of the persisted entity and what
/// happened to it.
fn persist_one<P: Persister>(
    persister: &P,
    dto: &P::Dto,
    ctx: &mut PersistContext<'_>,
) -> ImportResult<(Uid, Outcome)> {
    let triggers = persister.triggers(dto, ctx.preheat);
    let mut entity = persister.convert(ctx, dto)?;
    let uid = persister.entity_uid(&entity);
    persister.persist_ownership(ctx, &entity)?;

    let is_new = persister.is_new(ctx.preheat, &entity)?;
    let outcome = if is_new {
        ctx.store.insert(&entity.clone().into())?;
        persister.apply_values(ctx, dto, &mut entity)?;
        Outcome::Created
    } else if persister.is_updatable() {
        persister.apply_values(ctx, dto, &mut entity)?;
        ctx.store.update(&entity.clone().into())?;
        Outcome::Updated
    } else {
        debug!(tracker_type = %P::TRACKER_TYPE, %uid, "already exists, ignored");
        return Ok((uid, Outcome::Ignored));
    };

    let touched = persister.touched_tracked_entities(ctx.preheat, &entity, is_new)?;
    ctx.touched.extend(touched);

    if !ctx.params.skip_side_effects {
        ctx.notifications.push(NotificationDescriptor {
            tracker_type: P::TRACKER_TYPE,
            uid,
            triggers,
            actor: ctx.params.user.clone(),
        });
    }

    persister.update_preheat(ctx.preheat, &entity);

    if ctx.params.flush_per_object() {
        ctx.store.flush()?;
    }

    debug!(tracker_type = %P::TRACKER_TYPE, %uid, ?outcome, "persisted");
    Ok((uid, outcome))
}
