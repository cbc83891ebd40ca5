//! The storage-engine contract.

use tracker_model::{
    AttributeValue, ChangeLogEntry, DataValue, Enrollment, FileResource, NotificationInstance,
    Ownership, Relationship, RelationshipItem, TrackerEntity, TrackerEvent,
};
use tracker_types::{TrackerType, Uid};

use crate::StorageResult;

/// Owner rows of the five tracker kinds, plus program ownership.
pub trait EntityStore {
    /// Loads an entity with its value rows. Soft-deleted rows are returned too.
    fn get(&self, tracker_type: TrackerType, uid: &Uid) -> StorageResult<Option<TrackerEntity>>;

    /// Inserts a new owner row. Value rows carried by the aggregate are ignored;
    /// they are written through [`ValueStore`].
    fn insert(&mut self, entity: &TrackerEntity) -> StorageResult<()>;

    /// Merges an existing owner row. Value rows are left untouched.
    fn update(&mut self, entity: &TrackerEntity) -> StorageResult<()>;

    /// Flags the row deleted.
    fn soft_delete(&mut self, tracker_type: TrackerType, uid: &Uid) -> StorageResult<()>;

    /// All enrollments of a tracked entity, deleted ones included.
    fn enrollments_of(&self, tracked_entity: &Uid) -> StorageResult<Vec<Enrollment>>;

    /// All events of an enrollment, deleted ones included.
    fn events_of(&self, enrollment: &Uid) -> StorageResult<Vec<TrackerEvent>>;

    /// Live relationships with `item` on either side.
    fn relationships_touching(&self, item: &RelationshipItem) -> StorageResult<Vec<Relationship>>;

    fn ownership(&self, tracked_entity: &Uid, program: &Uid) -> StorageResult<Option<Ownership>>;

    fn insert_ownership(&mut self, ownership: &Ownership) -> StorageResult<()>;
}

/// Attribute and data value rows.
pub trait ValueStore {
    fn insert_attribute_value(&mut self, tracked_entity: &Uid, value: &AttributeValue) -> StorageResult<()>;

    fn update_attribute_value(&mut self, tracked_entity: &Uid, value: &AttributeValue) -> StorageResult<()>;

    fn delete_attribute_value(&mut self, tracked_entity: &Uid, attribute: &Uid) -> StorageResult<()>;

    /// Removes every attribute value of a tracked entity, returning the removed keys.
    fn delete_attribute_values(&mut self, tracked_entity: &Uid) -> StorageResult<Vec<Uid>>;

    fn insert_data_value(&mut self, event: &Uid, value: &DataValue) -> StorageResult<()>;

    fn update_data_value(&mut self, event: &Uid, value: &DataValue) -> StorageResult<()>;

    fn delete_data_value(&mut self, event: &Uid, data_element: &Uid) -> StorageResult<()>;
}

/// Value-level audit trail.
pub trait ChangeLogStore {
    fn write_change_log(&mut self, entry: ChangeLogEntry) -> StorageResult<()>;

    fn change_logs(&self, owner_type: TrackerType, owner: &Uid) -> StorageResult<Vec<ChangeLogEntry>>;

    /// Returns the number of entries removed.
    fn delete_change_logs(&mut self, owner_type: TrackerType, owner: &Uid) -> StorageResult<usize>;
}

/// Registry of uploaded files referenced by file-typed values.
pub trait FileResourceStore {
    fn file_resource(&self, uid: &Uid) -> StorageResult<Option<FileResource>>;

    fn save_file_resource(&mut self, resource: &FileResource) -> StorageResult<()>;

    /// Marks the file as referenced by `owner`.
    fn assign_file_resource(&mut self, uid: &Uid, owner: &Uid) -> StorageResult<()>;

    /// Marks the file as no longer referenced.
    fn unassign_file_resource(&mut self, uid: &Uid) -> StorageResult<()>;
}

/// Pending scheduled notifications.
pub trait NotificationStore {
    fn save_notification_instance(&mut self, instance: &NotificationInstance) -> StorageResult<()>;

    fn notification_instances(&self, owner_type: TrackerType, owner: &Uid) -> StorageResult<Vec<NotificationInstance>>;

    /// Returns the number of instances removed.
    fn delete_notification_instances(&mut self, owner_type: TrackerType, owner: &Uid) -> StorageResult<usize>;
}

/// Handle to a savepoint inside the open transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint(pub(crate) usize);

impl Savepoint {
    pub fn depth(&self) -> usize {
        self.0
    }
}

/// Transaction, savepoint and flush control.
pub trait Transactional {
    fn begin(&mut self) -> StorageResult<()>;

    /// Flushes pending writes and makes the transaction durable.
    fn commit(&mut self) -> StorageResult<()>;

    /// Discards every write of the open transaction.
    fn rollback(&mut self) -> StorageResult<()>;

    fn in_transaction(&self) -> bool;

    /// Checks every write made since the last flush against storage
    /// constraints.
    fn flush(&mut self) -> StorageResult<()>;

    fn savepoint(&mut self) -> StorageResult<Savepoint>;

    /// Undoes every write made after `savepoint`. The savepoint stays valid.
    fn rollback_to_savepoint(&mut self, savepoint: Savepoint) -> StorageResult<()>;

    /// Forgets `savepoint` and every savepoint taken after it.
    fn release_savepoint(&mut self, savepoint: Savepoint) -> StorageResult<()>;
}

/// Everything the persistence core needs from a storage engine.
pub trait TrackerStore:
    EntityStore + ValueStore + ChangeLogStore + FileResourceStore + NotificationStore + Transactional
{
}

impl<T> TrackerStore for T where
    T: EntityStore + ValueStore + ChangeLogStore + FileResourceStore + NotificationStore + Transactional
{
}
