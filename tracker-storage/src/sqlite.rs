//! SQLite-backed transactional store.
//!
//! Every row keeps its full record as a JSON blob next to the key columns
//! that constraints and lookups need. References between rows are declared
//! `DEFERRABLE INITIALLY DEFERRED`, so a child may be written before its
//! parent inside one transaction. [`Transactional::flush`] runs
//! `PRAGMA foreign_key_check` over the tables written since the last flush;
//! `COMMIT` enforces the same constraints once more.

use rusqlite::{Connection, ErrorCode, OptionalExtension, ToSql, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};
use tracker_model::{
    AttributeValue, ChangeLogEntry, DataValue, Enrollment, FileResource, NotificationInstance,
    Ownership, Relationship, RelationshipItem, SingleEvent, TrackedEntity, TrackerEntity,
    TrackerEvent,
};
use tracker_types::{TrackerType, Uid};

use crate::store::{
    ChangeLogStore, EntityStore, FileResourceStore, NotificationStore, Savepoint, Transactional,
    ValueStore,
};
use crate::{StorageError, StorageResult};

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS tracked_entities (
        uid TEXT PRIMARY KEY,
        deleted INTEGER NOT NULL DEFAULT 0,
        data TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS enrollments (
        uid TEXT PRIMARY KEY,
        tracked_entity TEXT NOT NULL
            REFERENCES tracked_entities(uid) DEFERRABLE INITIALLY DEFERRED,
        deleted INTEGER NOT NULL DEFAULT 0,
        data TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS enrollments_by_tracked_entity ON enrollments(tracked_entity);

    CREATE TABLE IF NOT EXISTS events (
        uid TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        enrollment TEXT REFERENCES enrollments(uid) DEFERRABLE INITIALLY DEFERRED,
        deleted INTEGER NOT NULL DEFAULT 0,
        data TEXT NOT NULL,
        CHECK ((kind = 'TRACKER_EVENT') = (enrollment IS NOT NULL))
    );
    CREATE INDEX IF NOT EXISTS events_by_enrollment ON events(enrollment);

    CREATE TABLE IF NOT EXISTS relationships (
        uid TEXT PRIMARY KEY,
        from_tracked_entity TEXT REFERENCES tracked_entities(uid) DEFERRABLE INITIALLY DEFERRED,
        from_enrollment TEXT REFERENCES enrollments(uid) DEFERRABLE INITIALLY DEFERRED,
        from_event TEXT REFERENCES events(uid) DEFERRABLE INITIALLY DEFERRED,
        to_tracked_entity TEXT REFERENCES tracked_entities(uid) DEFERRABLE INITIALLY DEFERRED,
        to_enrollment TEXT REFERENCES enrollments(uid) DEFERRABLE INITIALLY DEFERRED,
        to_event TEXT REFERENCES events(uid) DEFERRABLE INITIALLY DEFERRED,
        deleted INTEGER NOT NULL DEFAULT 0,
        data TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS attribute_values (
        tracked_entity TEXT NOT NULL
            REFERENCES tracked_entities(uid) DEFERRABLE INITIALLY DEFERRED,
        attribute TEXT NOT NULL,
        data TEXT NOT NULL,
        PRIMARY KEY (tracked_entity, attribute)
    );

    CREATE TABLE IF NOT EXISTS data_values (
        event TEXT NOT NULL REFERENCES events(uid) DEFERRABLE INITIALLY DEFERRED,
        data_element TEXT NOT NULL,
        data TEXT NOT NULL,
        PRIMARY KEY (event, data_element)
    );

    CREATE TABLE IF NOT EXISTS ownerships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tracked_entity TEXT NOT NULL
            REFERENCES tracked_entities(uid) DEFERRABLE INITIALLY DEFERRED,
        program TEXT NOT NULL,
        data TEXT NOT NULL,
        UNIQUE (tracked_entity, program)
    );

    CREATE TABLE IF NOT EXISTS change_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_type TEXT NOT NULL,
        owner TEXT NOT NULL,
        data TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS change_logs_by_owner ON change_logs(owner_type, owner);

    CREATE TABLE IF NOT EXISTS file_resources (
        uid TEXT PRIMARY KEY,
        data TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notification_instances (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_type TEXT NOT NULL,
        owner TEXT NOT NULL,
        data TEXT NOT NULL
    );
";

/// Storage engine over one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
    /// Savepoints currently open, innermost last.
    savepoints: usize,
    /// Tables written since the last flush.
    dirty: BTreeSet<&'static str>,
    unchecked: usize,
    flushes: usize,
}

/// The owner row of one entity, stripped of its value rows.
struct OwnerRow {
    table: &'static str,
    uid: String,
    deleted: bool,
    data: String,
    /// Key columns beyond `uid`, `deleted` and `data`.
    columns: Vec<(&'static str, Option<String>)>,
}

impl OwnerRow {
    fn of(entity: &TrackerEntity) -> StorageResult<Self> {
        let (table, data, columns) = match entity {
            TrackerEntity::TrackedEntity(te) => {
                let mut row = te.clone();
                row.attribute_values.clear();
                ("tracked_entities", encode(&row)?, Vec::new())
            }
            TrackerEntity::Enrollment(enrollment) => (
                "enrollments",
                encode(enrollment)?,
                vec![("tracked_entity", Some(enrollment.tracked_entity.to_string()))],
            ),
            TrackerEntity::TrackerEvent(event) => {
                let mut row = event.clone();
                row.data_values.clear();
                (
                    "events",
                    encode(&row)?,
                    vec![
                        ("kind", Some(TrackerType::TrackerEvent.to_string())),
                        ("enrollment", Some(event.enrollment.to_string())),
                    ],
                )
            }
            TrackerEntity::SingleEvent(event) => {
                let mut row = event.clone();
                row.data_values.clear();
                (
                    "events",
                    encode(&row)?,
                    vec![
                        ("kind", Some(TrackerType::SingleEvent.to_string())),
                        ("enrollment", None),
                    ],
                )
            }
            TrackerEntity::Relationship(relationship) => {
                let mut columns = item_columns("from", &relationship.from);
                columns.extend(item_columns("to", &relationship.to));
                ("relationships", encode(relationship)?, columns)
            }
        };
        Ok(Self {
            table,
            uid: entity.uid().to_string(),
            deleted: entity.is_deleted(),
            data,
            columns,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        let mut values: Vec<&dyn ToSql> = vec![
            &self.uid as &dyn ToSql,
            &self.deleted as &dyn ToSql,
            &self.data as &dyn ToSql,
        ];
        values.extend(self.columns.iter().map(|(_, value)| value as &dyn ToSql));
        values
    }

    fn insert_sql(&self) -> String {
        let mut names = vec!["uid", "deleted", "data"];
        names.extend(self.columns.iter().map(|(name, _)| *name));
        let slots: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            slots.join(", ")
        )
    }

    fn update_sql(&self) -> String {
        let mut sets = vec!["deleted = ?2".to_string(), "data = ?3".to_string()];
        sets.extend(
            self.columns
                .iter()
                .enumerate()
                .map(|(i, (name, _))| format!("{name} = ?{}", i + 4)),
        );
        format!("UPDATE {} SET {} WHERE uid = ?1", self.table, sets.join(", "))
    }
}

/// `from_*`/`to_*` reference columns of one relationship side; only the
/// column matching the item kind is set.
fn item_columns(side: &str, item: &RelationshipItem) -> Vec<(&'static str, Option<String>)> {
    let uid = Some(item.uid().to_string());
    let (te, enrollment, event) = match item {
        RelationshipItem::TrackedEntity(_) => (uid, None, None),
        RelationshipItem::Enrollment(_) => (None, uid, None),
        RelationshipItem::Event(_) => (None, None, uid),
    };
    if side == "from" {
        vec![
            ("from_tracked_entity", te),
            ("from_enrollment", enrollment),
            ("from_event", event),
        ]
    } else {
        vec![
            ("to_tracked_entity", te),
            ("to_enrollment", enrollment),
            ("to_event", event),
        ]
    }
}

fn item_column(item: &RelationshipItem) -> &'static str {
    match item {
        RelationshipItem::TrackedEntity(_) => "tracked_entity",
        RelationshipItem::Enrollment(_) => "enrollment",
        RelationshipItem::Event(_) => "event",
    }
}

fn encode<T: Serialize>(value: &T) -> StorageResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(data: &str) -> StorageResult<T> {
    Ok(serde_json::from_str(data)?)
}

/// Constraint failures become [`StorageError::ConstraintViolation`]; anything
/// else stays a database error.
fn write_error(err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(
                message.clone().unwrap_or_else(|| failure.to_string()),
            )
        }
        _ => StorageError::Database(err),
    }
}

impl SqliteStore {
    /// Opens a private in-memory database with the tracker schema.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        debug!("opened in-memory tracker store");
        Ok(Self {
            conn,
            savepoints: 0,
            dirty: BTreeSet::new(),
            unchecked: 0,
            flushes: 0,
        })
    }

    /// Number of flushes performed so far, commits included.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Number of writes not yet checked by a flush.
    pub fn unchecked_writes(&self) -> usize {
        self.unchecked
    }

    /// All ownership rows, in insertion order.
    pub fn ownerships(&self) -> StorageResult<Vec<Ownership>> {
        self.query_all("SELECT data FROM ownerships ORDER BY id", [])
    }

    fn require_transaction(&self) -> StorageResult<()> {
        if self.conn.is_autocommit() {
            Err(StorageError::NoTransaction)
        } else {
            Ok(())
        }
    }

    /// Runs one write statement inside the open transaction.
    fn write(&mut self, table: &'static str, sql: &str, values: &[&dyn ToSql]) -> StorageResult<usize> {
        self.require_transaction()?;
        let changed = self
            .conn
            .prepare_cached(sql)
            .and_then(|mut stmt| stmt.execute(values))
            .map_err(write_error)?;
        self.dirty.insert(table);
        self.unchecked += 1;
        Ok(changed)
    }

    fn query_one<T: DeserializeOwned>(&self, sql: &str, values: &[&dyn ToSql]) -> StorageResult<Option<T>> {
        let data: Option<String> = self
            .conn
            .prepare_cached(sql)?
            .query_row(values, |row| row.get(0))
            .optional()?;
        data.as_deref().map(decode).transpose()
    }

    fn query_all<T: DeserializeOwned>(&self, sql: &str, values: impl rusqlite::Params) -> StorageResult<Vec<T>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(values, |row| row.get::<_, String>(0))?;
        let mut result = Vec::new();
        for data in rows {
            result.push(decode(&data?)?);
        }
        Ok(result)
    }

    fn attribute_values_of(&self, tracked_entity: &Uid) -> StorageResult<BTreeMap<Uid, AttributeValue>> {
        let rows: Vec<AttributeValue> = self.query_all(
            "SELECT data FROM attribute_values WHERE tracked_entity = ?1",
            params![tracked_entity.to_string()],
        )?;
        Ok(rows.into_iter().map(|row| (row.attribute, row)).collect())
    }

    fn data_values_of(&self, event: &Uid) -> StorageResult<BTreeMap<Uid, DataValue>> {
        let rows: Vec<DataValue> = self.query_all(
            "SELECT data FROM data_values WHERE event = ?1",
            params![event.to_string()],
        )?;
        Ok(rows.into_iter().map(|row| (row.data_element, row)).collect())
    }

    fn event_row<T: DeserializeOwned>(&self, kind: TrackerType, uid: &Uid) -> StorageResult<Option<T>> {
        self.query_one(
            "SELECT data FROM events WHERE uid = ?1 AND kind = ?2",
            params![uid.to_string(), kind.as_str()],
        )
    }

    fn update_file_resource(&mut self, uid: &Uid, assign_to: Option<Uid>) -> StorageResult<()> {
        let mut resource = self
            .file_resource(uid)?
            .ok_or_else(|| StorageError::NotFound(format!("file resource {uid}")))?;
        resource.assigned = assign_to.is_some();
        resource.owner = assign_to;
        self.write(
            "file_resources",
            "UPDATE file_resources SET data = ?2 WHERE uid = ?1",
            params![uid.to_string(), encode(&resource)?],
        )?;
        Ok(())
    }
}

// ── Transactions ─────────────────────────────────────────────────

impl Transactional for SqliteStore {
    fn begin(&mut self) -> StorageResult<()> {
        if !self.conn.is_autocommit() {
            return Err(StorageError::TransactionActive);
        }
        self.conn.execute_batch("BEGIN")?;
        debug!("transaction started");
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.flush()?;
        self.conn.execute_batch("COMMIT").map_err(write_error)?;
        self.savepoints = 0;
        debug!("transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        self.require_transaction()?;
        self.conn.execute_batch("ROLLBACK")?;
        self.savepoints = 0;
        self.dirty.clear();
        self.unchecked = 0;
        debug!("transaction rolled back");
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.require_transaction()?;
        trace!(pending = self.unchecked, tables = self.dirty.len(), "flushing");
        for table in &self.dirty {
            let violation: Option<(String, Option<i64>, String)> = self
                .conn
                .query_row(&format!("PRAGMA foreign_key_check({table})"), [], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })
                .optional()?;
            if let Some((child, rowid, parent)) = violation {
                return Err(StorageError::ConstraintViolation(format!(
                    "{child} row {} references a missing {parent} row",
                    rowid.unwrap_or_default()
                )));
            }
        }
        self.dirty.clear();
        self.unchecked = 0;
        self.flushes += 1;
        Ok(())
    }

    fn savepoint(&mut self) -> StorageResult<Savepoint> {
        self.require_transaction()?;
        let depth = self.savepoints;
        self.conn.execute_batch(&format!("SAVEPOINT sp_{depth}"))?;
        self.savepoints += 1;
        Ok(Savepoint(depth))
    }

    fn rollback_to_savepoint(&mut self, savepoint: Savepoint) -> StorageResult<()> {
        if savepoint.0 >= self.savepoints {
            return Err(StorageError::UnknownSavepoint(savepoint.0));
        }
        self.conn
            .execute_batch(&format!("ROLLBACK TO sp_{}", savepoint.0))?;
        self.savepoints = savepoint.0 + 1;
        Ok(())
    }

    fn release_savepoint(&mut self, savepoint: Savepoint) -> StorageResult<()> {
        if savepoint.0 >= self.savepoints {
            return Err(StorageError::UnknownSavepoint(savepoint.0));
        }
        self.conn.execute_batch(&format!("RELEASE sp_{}", savepoint.0))?;
        self.savepoints = savepoint.0;
        Ok(())
    }
}

// ── Entities ─────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
    fn get(&self, tracker_type: TrackerType, uid: &Uid) -> StorageResult<Option<TrackerEntity>> {
        let key = uid.to_string();
        Ok(match tracker_type {
            TrackerType::TrackedEntity => {
                let row: Option<TrackedEntity> =
                    self.query_one("SELECT data FROM tracked_entities WHERE uid = ?1", params![key])?;
                match row {
                    Some(mut te) => {
                        te.attribute_values = self.attribute_values_of(uid)?;
                        Some(te.into())
                    }
                    None => None,
                }
            }
            TrackerType::Enrollment => self
                .query_one::<Enrollment>("SELECT data FROM enrollments WHERE uid = ?1", params![key])?
                .map(Into::into),
            TrackerType::TrackerEvent => match self.event_row::<TrackerEvent>(tracker_type, uid)? {
                Some(mut event) => {
                    event.data_values = self.data_values_of(uid)?;
                    Some(event.into())
                }
                None => None,
            },
            TrackerType::SingleEvent => match self.event_row::<SingleEvent>(tracker_type, uid)? {
                Some(mut event) => {
                    event.data_values = self.data_values_of(uid)?;
                    Some(event.into())
                }
                None => None,
            },
            TrackerType::Relationship => self
                .query_one::<Relationship>("SELECT data FROM relationships WHERE uid = ?1", params![key])?
                .map(Into::into),
        })
    }

    fn insert(&mut self, entity: &TrackerEntity) -> StorageResult<()> {
        let row = OwnerRow::of(entity)?;
        self.write(row.table, &row.insert_sql(), &row.values())?;
        Ok(())
    }

    fn update(&mut self, entity: &TrackerEntity) -> StorageResult<()> {
        let row = OwnerRow::of(entity)?;
        if self.write(row.table, &row.update_sql(), &row.values())? == 0 {
            return Err(StorageError::NotFound(format!(
                "{} {}",
                entity.tracker_type(),
                entity.uid()
            )));
        }
        Ok(())
    }

    fn soft_delete(&mut self, tracker_type: TrackerType, uid: &Uid) -> StorageResult<()> {
        let mut entity = self
            .get(tracker_type, uid)?
            .ok_or_else(|| StorageError::NotFound(format!("{tracker_type} {uid}")))?;
        entity.mark_deleted();
        self.update(&entity)
    }

    fn enrollments_of(&self, tracked_entity: &Uid) -> StorageResult<Vec<Enrollment>> {
        self.query_all(
            "SELECT data FROM enrollments WHERE tracked_entity = ?1 ORDER BY uid",
            params![tracked_entity.to_string()],
        )
    }

    fn events_of(&self, enrollment: &Uid) -> StorageResult<Vec<TrackerEvent>> {
        let mut events: Vec<TrackerEvent> = self.query_all(
            "SELECT data FROM events WHERE enrollment = ?1 ORDER BY uid",
            params![enrollment.to_string()],
        )?;
        for event in &mut events {
            event.data_values = self.data_values_of(&event.uid)?;
        }
        Ok(events)
    }

    fn relationships_touching(&self, item: &RelationshipItem) -> StorageResult<Vec<Relationship>> {
        let column = item_column(item);
        self.query_all(
            &format!(
                "SELECT data FROM relationships \
                 WHERE deleted = 0 AND (from_{column} = ?1 OR to_{column} = ?1) ORDER BY uid"
            ),
            params![item.uid().to_string()],
        )
    }

    fn ownership(&self, tracked_entity: &Uid, program: &Uid) -> StorageResult<Option<Ownership>> {
        self.query_one(
            "SELECT data FROM ownerships WHERE tracked_entity = ?1 AND program = ?2",
            params![tracked_entity.to_string(), program.to_string()],
        )
    }

    fn insert_ownership(&mut self, ownership: &Ownership) -> StorageResult<()> {
        self.write(
            "ownerships",
            "INSERT INTO ownerships (tracked_entity, program, data) VALUES (?1, ?2, ?3)",
            params![
                ownership.tracked_entity.to_string(),
                ownership.program.to_string(),
                encode(ownership)?,
            ],
        )?;
        Ok(())
    }
}

// ── Values ───────────────────────────────────────────────────────

impl ValueStore for SqliteStore {
    fn insert_attribute_value(&mut self, tracked_entity: &Uid, value: &AttributeValue) -> StorageResult<()> {
        self.write(
            "attribute_values",
            "INSERT INTO attribute_values (tracked_entity, attribute, data) VALUES (?1, ?2, ?3)",
            params![tracked_entity.to_string(), value.attribute.to_string(), encode(value)?],
        )?;
        Ok(())
    }

    fn update_attribute_value(&mut self, tracked_entity: &Uid, value: &AttributeValue) -> StorageResult<()> {
        let changed = self.write(
            "attribute_values",
            "UPDATE attribute_values SET data = ?3 WHERE tracked_entity = ?1 AND attribute = ?2",
            params![tracked_entity.to_string(), value.attribute.to_string(), encode(value)?],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!(
                "attribute value {} on tracked entity {tracked_entity}",
                value.attribute
            )));
        }
        Ok(())
    }

    fn delete_attribute_value(&mut self, tracked_entity: &Uid, attribute: &Uid) -> StorageResult<()> {
        let changed = self.write(
            "attribute_values",
            "DELETE FROM attribute_values WHERE tracked_entity = ?1 AND attribute = ?2",
            params![tracked_entity.to_string(), attribute.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!(
                "attribute value {attribute} on tracked entity {tracked_entity}"
            )));
        }
        Ok(())
    }

    fn delete_attribute_values(&mut self, tracked_entity: &Uid) -> StorageResult<Vec<Uid>> {
        let keys: Vec<Uid> = self.attribute_values_of(tracked_entity)?.into_keys().collect();
        self.write(
            "attribute_values",
            "DELETE FROM attribute_values WHERE tracked_entity = ?1",
            params![tracked_entity.to_string()],
        )?;
        Ok(keys)
    }

    fn insert_data_value(&mut self, event: &Uid, value: &DataValue) -> StorageResult<()> {
        self.write(
            "data_values",
            "INSERT INTO data_values (event, data_element, data) VALUES (?1, ?2, ?3)",
            params![event.to_string(), value.data_element.to_string(), encode(value)?],
        )?;
        Ok(())
    }

    fn update_data_value(&mut self, event: &Uid, value: &DataValue) -> StorageResult<()> {
        let changed = self.write(
            "data_values",
            "UPDATE data_values SET data = ?3 WHERE event = ?1 AND data_element = ?2",
            params![event.to_string(), value.data_element.to_string(), encode(value)?],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!(
                "data value {} on event {event}",
                value.data_element
            )));
        }
        Ok(())
    }

    fn delete_data_value(&mut self, event: &Uid, data_element: &Uid) -> StorageResult<()> {
        let changed = self.write(
            "data_values",
            "DELETE FROM data_values WHERE event = ?1 AND data_element = ?2",
            params![event.to_string(), data_element.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!(
                "data value {data_element} on event {event}"
            )));
        }
        Ok(())
    }
}

// ── Audit, files, notifications ──────────────────────────────────

impl ChangeLogStore for SqliteStore {
    fn write_change_log(&mut self, entry: ChangeLogEntry) -> StorageResult<()> {
        self.write(
            "change_logs",
            "INSERT INTO change_logs (owner_type, owner, data) VALUES (?1, ?2, ?3)",
            params![entry.owner_type.as_str(), entry.owner.to_string(), encode(&entry)?],
        )?;
        Ok(())
    }

    fn change_logs(&self, owner_type: TrackerType, owner: &Uid) -> StorageResult<Vec<ChangeLogEntry>> {
        self.query_all(
            "SELECT data FROM change_logs WHERE owner_type = ?1 AND owner = ?2 ORDER BY id",
            params![owner_type.as_str(), owner.to_string()],
        )
    }

    fn delete_change_logs(&mut self, owner_type: TrackerType, owner: &Uid) -> StorageResult<usize> {
        self.write(
            "change_logs",
            "DELETE FROM change_logs WHERE owner_type = ?1 AND owner = ?2",
            params![owner_type.as_str(), owner.to_string()],
        )
    }
}

impl FileResourceStore for SqliteStore {
    fn file_resource(&self, uid: &Uid) -> StorageResult<Option<FileResource>> {
        self.query_one(
            "SELECT data FROM file_resources WHERE uid = ?1",
            params![uid.to_string()],
        )
    }

    fn save_file_resource(&mut self, resource: &FileResource) -> StorageResult<()> {
        self.write(
            "file_resources",
            "INSERT OR REPLACE INTO file_resources (uid, data) VALUES (?1, ?2)",
            params![resource.uid.to_string(), encode(resource)?],
        )?;
        Ok(())
    }

    fn assign_file_resource(&mut self, uid: &Uid, owner: &Uid) -> StorageResult<()> {
        self.update_file_resource(uid, Some(*owner))
    }

    fn unassign_file_resource(&mut self, uid: &Uid) -> StorageResult<()> {
        self.update_file_resource(uid, None)
    }
}

impl NotificationStore for SqliteStore {
    fn save_notification_instance(&mut self, instance: &NotificationInstance) -> StorageResult<()> {
        self.write(
            "notification_instances",
            "INSERT INTO notification_instances (owner_type, owner, data) VALUES (?1, ?2, ?3)",
            params![
                instance.owner_type.as_str(),
                instance.owner.to_string(),
                encode(instance)?,
            ],
        )?;
        Ok(())
    }

    fn notification_instances(&self, owner_type: TrackerType, owner: &Uid) -> StorageResult<Vec<NotificationInstance>> {
        self.query_all(
            "SELECT data FROM notification_instances WHERE owner_type = ?1 AND owner = ?2 ORDER BY id",
            params![owner_type.as_str(), owner.to_string()],
        )
    }

    fn delete_notification_instances(&mut self, owner_type: TrackerType, owner: &Uid) -> StorageResult<usize> {
        self.write(
            "notification_instances",
            "DELETE FROM notification_instances WHERE owner_type = ?1 AND owner = ?2",
            params![owner_type.as_str(), owner.to_string()],
        )
    }
}
