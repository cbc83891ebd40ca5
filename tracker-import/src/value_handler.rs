//! Applies classified value changes to storage.
//!
//! Attribute values and data values share one algorithm; a [`ValueTable`]
//! supplies the row type, its storage calls and its metadata lookups.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;
use tracker_model::{AttributeValue, ChangeLogEntry, DataValue, UserInfo};
use tracker_storage::{StorageError, StorageResult, TrackerStore};
use tracker_types::{TrackerType, Uid};

use crate::differ::ValueChange;
use crate::{ImportResult, PersistContext, Preheat};

/// The owner whose values are being changed.
#[derive(Debug, Clone, Copy)]
pub struct ValueOwner {
    pub tracker_type: TrackerType,
    pub uid: Uid,
    /// Whether changes are written to the change log.
    pub audit: bool,
}

/// One kind of value row.
pub trait ValueTable {
    type Row: Clone;

    fn new_row(key: Uid, value: &str, user: &UserInfo, now: DateTime<Utc>) -> Self::Row;

    fn value(row: &Self::Row) -> &str;

    fn set_value(row: &mut Self::Row, value: &str, user: &UserInfo, now: DateTime<Utc>);

    /// Whether the key's values reference file resources.
    fn is_file(preheat: &Preheat, key: &Uid) -> ImportResult<bool>;

    fn insert(store: &mut dyn TrackerStore, owner: &Uid, row: &Self::Row) -> StorageResult<()>;

    fn update(store: &mut dyn TrackerStore, owner: &Uid, row: &Self::Row) -> StorageResult<()>;

    fn delete(store: &mut dyn TrackerStore, owner: &Uid, key: &Uid) -> StorageResult<()>;

    /// Runs after a value was created or updated.
    fn after_write(_ctx: &mut PersistContext<'_>, _key: &Uid, _value: &str) -> ImportResult<()> {
        Ok(())
    }
}

/// Tracked-entity attribute values.
pub struct AttributeTable;

impl ValueTable for AttributeTable {
    type Row = AttributeValue;

    fn new_row(key: Uid, value: &str, user: &UserInfo, now: DateTime<Utc>) -> AttributeValue {
        AttributeValue::new(key, value, user, now)
    }

    fn value(row: &AttributeValue) -> &str {
        &row.value
    }

    fn set_value(row: &mut AttributeValue, value: &str, user: &UserInfo, now: DateTime<Utc>) {
        row.value = value.to_string();
        row.last_updated = now;
        row.stored_by = user.username.clone();
    }

    fn is_file(preheat: &Preheat, key: &Uid) -> ImportResult<bool> {
        Ok(preheat.attribute(key)?.value_type.is_file())
    }

    fn insert(store: &mut dyn TrackerStore, owner: &Uid, row: &AttributeValue) -> StorageResult<()> {
        store.insert_attribute_value(owner, row)
    }

    fn update(store: &mut dyn TrackerStore, owner: &Uid, row: &AttributeValue) -> StorageResult<()> {
        store.update_attribute_value(owner, row)
    }

    fn delete(store: &mut dyn TrackerStore, owner: &Uid, key: &Uid) -> StorageResult<()> {
        store.delete_attribute_value(owner, key)
    }

    fn after_write(ctx: &mut PersistContext<'_>, key: &Uid, value: &str) -> ImportResult<()> {
        let attribute = ctx.preheat.attribute(key)?;
        if let Some(pattern) = attribute.reserved_pattern() {
            ctx.used_values.push((pattern.to_string(), value.to_string()));
        }
        Ok(())
    }
}

/// Event data values.
pub struct DataValueTable;

impl ValueTable for DataValueTable {
    type Row = DataValue;

    fn new_row(key: Uid, value: &str, user: &UserInfo, now: DateTime<Utc>) -> DataValue {
        DataValue::new(key, value, user, now)
    }

    fn value(row: &DataValue) -> &str {
        &row.value
    }

    fn set_value(row: &mut DataValue, value: &str, user: &UserInfo, now: DateTime<Utc>) {
        row.value = value.to_string();
        row.last_updated = now;
        row.last_updated_by = user.clone();
    }

    fn is_file(preheat: &Preheat, key: &Uid) -> ImportResult<bool> {
        Ok(preheat.data_element(key)?.value_type.is_file())
    }

    fn insert(store: &mut dyn TrackerStore, owner: &Uid, row: &DataValue) -> StorageResult<()> {
        store.insert_data_value(owner, row)
    }

    fn update(store: &mut dyn TrackerStore, owner: &Uid, row: &DataValue) -> StorageResult<()> {
        store.update_data_value(owner, row)
    }

    fn delete(store: &mut dyn TrackerStore, owner: &Uid, key: &Uid) -> StorageResult<()> {
        store.delete_data_value(owner, key)
    }
}

/// Stored values as the differ sees them.
pub fn current_values<T: ValueTable>(rows: &BTreeMap<Uid, T::Row>) -> BTreeMap<Uid, String> {
    rows.iter()
        .map(|(key, row)| (*key, T::value(row).to_string()))
        .collect()
}

/// Applies `changes` to storage and to the owner's in-memory `rows`.
pub fn apply_changes<T: ValueTable>(
    ctx: &mut PersistContext<'_>,
    owner: &ValueOwner,
    rows: &mut BTreeMap<Uid, T::Row>,
    changes: &[ValueChange],
) -> ImportResult<()> {
    for change in changes {
        let key = *change.key();
        let is_file = T::is_file(ctx.preheat, &key)?;

        match change {
            ValueChange::Create { value, .. } => {
                let row = T::new_row(key, value, ctx.user(), ctx.now);
                T::insert(ctx.store, &owner.uid, &row)?;
                rows.insert(key, row);
                if is_file {
                    ctx.store.assign_file_resource(&Uid::parse(value)?, &owner.uid)?;
                }
                T::after_write(ctx, &key, value)?;
            }
            ValueChange::Update { previous, value, .. } => {
                let row = rows.get_mut(&key).ok_or_else(|| {
                    StorageError::NotFound(format!("value {key} of {} {}", owner.tracker_type, owner.uid))
                })?;
                T::set_value(row, value, &ctx.params.user, ctx.now);
                T::update(ctx.store, &owner.uid, row)?;
                if is_file {
                    ctx.store.unassign_file_resource(&Uid::parse(previous)?)?;
                    ctx.store.assign_file_resource(&Uid::parse(value)?, &owner.uid)?;
                }
                T::after_write(ctx, &key, value)?;
            }
            ValueChange::Delete { previous, .. } => {
                T::delete(ctx.store, &owner.uid, &key)?;
                rows.remove(&key);
                if is_file {
                    ctx.store.unassign_file_resource(&Uid::parse(previous)?)?;
                }
            }
        }

        if owner.audit {
            ctx.store.write_change_log(ChangeLogEntry {
                owner_type: owner.tracker_type,
                owner: owner.uid,
                key,
                previous_value: change.previous().map(str::to_string),
                current_value: change.current().map(str::to_string),
                change_type: change.change_type(),
                created_by: ctx.params.user.username.clone(),
                created: ctx.now,
            })?;
        }
    }

    if !changes.is_empty() {
        debug!(
            owner = %owner.uid,
            tracker_type = %owner.tracker_type,
            changes = changes.len(),
            "applied value changes"
        );
    }
    Ok(())
}
