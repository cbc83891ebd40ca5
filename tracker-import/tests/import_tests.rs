mod common;

use common::{Fixture, PATTERN, bundle, drain, importer, note, seed_files};
use pretty_assertions::assert_eq;
use tracker_import::{
    ImportParams, ImportStatus, InMemoryReservedValues, NotificationTrigger, Outcome,
    ReservedValueService, TrackerBundle,
};
use tracker_model::{RelationshipItem, TrackerEntity, UserInfo, dto};
use tracker_storage::{ChangeLogStore, EntityStore, FileResourceStore, SqliteStore, Transactional};
use tracker_types::{
    AtomicMode, ChangeLogType, EventStatus, FlushMode, ImportStrategy, TrackerType, Uid,
};

fn tracked_entity(store: &impl EntityStore, uid: &Uid) -> tracker_model::TrackedEntity {
    match store.get(TrackerType::TrackedEntity, uid).unwrap() {
        Some(TrackerEntity::TrackedEntity(te)) => te,
        other => panic!("expected tracked entity, got {other:?}"),
    }
}

fn tracker_event(store: &impl EntityStore, uid: &Uid) -> tracker_model::TrackerEvent {
    match store.get(TrackerType::TrackerEvent, uid).unwrap() {
        Some(TrackerEntity::TrackerEvent(event)) => event,
        other => panic!("expected tracker event, got {other:?}"),
    }
}

fn enrollment(store: &impl EntityStore, uid: &Uid) -> tracker_model::Enrollment {
    match store.get(TrackerType::Enrollment, uid).unwrap() {
        Some(TrackerEntity::Enrollment(enrollment)) => enrollment,
        other => panic!("expected enrollment, got {other:?}"),
    }
}

// ── Create and update ────────────────────────────────────────────

#[test]
fn creates_a_full_hierarchy() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();
    let (te, en, ev) = (Uid::generate(), Uid::generate(), Uid::generate());

    let mut b = bundle(ImportParams::default());
    b.tracked_entities.push(f.tracked_entity(te, &[(f.text_attr, "Ada")]));
    b.enrollments.push(f.enrollment(en, te));
    b.tracker_events
        .push(f.event(ev, en, EventStatus::Active, &[(f.text_de, "3.2")]));

    let report = importer.import(&b, f.preheat());

    assert_eq!(report.status, ImportStatus::Ok);
    for tracker_type in [
        TrackerType::TrackedEntity,
        TrackerType::Enrollment,
        TrackerType::TrackerEvent,
    ] {
        assert_eq!(report.type_report(tracker_type).unwrap().stats.created, 1);
    }

    let store = importer.store();
    let stored = tracked_entity(store, &te);
    assert_eq!(stored.attribute_values[&f.text_attr].value, "Ada");
    assert!(store.ownership(&te, &f.program).unwrap().is_some());
    let Some(TrackerEntity::TrackerEvent(event)) = store.get(TrackerType::TrackerEvent, &ev).unwrap()
    else {
        panic!("event missing");
    };
    assert_eq!(event.data_values[&f.text_de].value, "3.2");

    let logs = store.change_logs(TrackerType::TrackedEntity, &te).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].change_type, ChangeLogType::Create);
    assert_eq!(logs[0].current_value.as_deref(), Some("Ada"));

    let descriptors = drain(&mut rx);
    assert_eq!(descriptors.len(), 3);
    assert!(descriptors.iter().all(|d| d.triggers.is_empty()));
}

#[test]
fn resubmission_updates_and_logs_the_change() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let te = Uid::generate();

    let mut first = bundle(ImportParams::default());
    first
        .tracked_entities
        .push(f.tracked_entity(te, &[(f.text_attr, "Ada"), (f.second_attr, "King")]));
    importer.import(&first, f.preheat());

    let mut second = bundle(ImportParams::default());
    second
        .tracked_entities
        .push(f.tracked_entity(te, &[(f.text_attr, "Ada"), (f.second_attr, "Lovelace")]));
    let preheat = f.reload(importer.store(), &[(TrackerType::TrackedEntity, te)]);
    let report = importer.import(&second, preheat);

    let stats = report.type_report(TrackerType::TrackedEntity).unwrap().stats;
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.created, 0);

    let logs = importer
        .store()
        .change_logs(TrackerType::TrackedEntity, &te)
        .unwrap();
    let updates: Vec<_> = logs
        .iter()
        .filter(|l| l.change_type == ChangeLogType::Update)
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].key, f.second_attr);
    assert_eq!(updates[0].previous_value.as_deref(), Some("King"));
    assert_eq!(updates[0].current_value.as_deref(), Some("Lovelace"));
}

#[test]
fn resubmitting_identical_payloads_changes_no_values() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (te, en, ev) = (Uid::generate(), Uid::generate(), Uid::generate());
    let (photo, scan) = (Uid::generate(), Uid::generate());
    seed_files(importer.store_mut(), &[photo, scan]);

    let mut b = bundle(ImportParams::default());
    b.tracked_entities.push(f.tracked_entity(
        te,
        &[(f.text_attr, "Ada"), (f.file_attr, photo.to_string().as_str())],
    ));
    b.enrollments.push(f.enrollment(en, te));
    b.tracker_events.push(f.event(
        ev,
        en,
        EventStatus::Active,
        &[(f.text_de, "3.2"), (f.file_de, scan.to_string().as_str())],
    ));
    assert_eq!(importer.import(&b, f.preheat()).status, ImportStatus::Ok);

    let snapshot = |store: &SqliteStore| {
        (
            tracked_entity(store, &te).attribute_values,
            tracker_event(store, &ev).data_values,
            store.change_logs(TrackerType::TrackedEntity, &te).unwrap(),
            store.change_logs(TrackerType::TrackerEvent, &ev).unwrap(),
            store.file_resource(&photo).unwrap(),
            store.file_resource(&scan).unwrap(),
        )
    };
    let first = snapshot(importer.store());
    assert_eq!((first.2.len(), first.3.len()), (2, 2));

    let preheat = f.reload(
        importer.store(),
        &[
            (TrackerType::TrackedEntity, te),
            (TrackerType::Enrollment, en),
            (TrackerType::TrackerEvent, ev),
        ],
    );
    let report = importer.import(&b, preheat);

    assert_eq!(report.status, ImportStatus::Ok);
    for tracker_type in [
        TrackerType::TrackedEntity,
        TrackerType::Enrollment,
        TrackerType::TrackerEvent,
    ] {
        assert_eq!(report.type_report(tracker_type).unwrap().stats.updated, 1);
    }
    assert_eq!(snapshot(importer.store()), first);
    assert_eq!(first.4.unwrap().owner, Some(te));
    assert_eq!(first.5.unwrap().owner, Some(ev));
}

#[test]
fn blanking_a_file_attribute_deletes_it_and_unassigns_the_file() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let te = Uid::generate();
    let file = Uid::generate();
    seed_files(importer.store_mut(), &[file]);

    let mut first = bundle(ImportParams::default());
    first
        .tracked_entities
        .push(f.tracked_entity(te, &[(f.file_attr, file.to_string().as_str())]));
    importer.import(&first, f.preheat());
    let assigned = importer.store().file_resource(&file).unwrap().unwrap();
    assert!(assigned.assigned);
    assert_eq!(assigned.owner, Some(te));

    let mut second = bundle(ImportParams::default());
    second.tracked_entities.push(f.tracked_entity(te, &[(f.file_attr, "")]));
    let preheat = f.reload(importer.store(), &[(TrackerType::TrackedEntity, te)]);
    let report = importer.import(&second, preheat);
    assert_eq!(report.status, ImportStatus::Ok);

    let store = importer.store();
    assert!(!store.file_resource(&file).unwrap().unwrap().assigned);
    assert!(tracked_entity(store, &te).attribute_values.is_empty());

    let kinds: Vec<ChangeLogType> = store
        .change_logs(TrackerType::TrackedEntity, &te)
        .unwrap()
        .iter()
        .filter(|l| l.key == f.file_attr)
        .map(|l| l.change_type)
        .collect();
    assert_eq!(kinds, vec![ChangeLogType::Create, ChangeLogType::Delete]);
}

#[test]
fn replacing_a_file_moves_the_assignment() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (en, ev) = (Uid::generate(), Uid::generate());
    let te = Uid::generate();
    let (old_file, new_file) = (Uid::generate(), Uid::generate());
    seed_files(importer.store_mut(), &[old_file, new_file]);

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(te, &[]));
    first.enrollments.push(f.enrollment(en, te));
    first.tracker_events.push(f.event(
        ev,
        en,
        EventStatus::Active,
        &[(f.file_de, old_file.to_string().as_str())],
    ));
    importer.import(&first, f.preheat());

    let mut second = bundle(ImportParams::default());
    second.tracker_events.push(f.event(
        ev,
        en,
        EventStatus::Active,
        &[(f.file_de, new_file.to_string().as_str())],
    ));
    let preheat = f.reload(
        importer.store(),
        &[
            (TrackerType::TrackedEntity, te),
            (TrackerType::Enrollment, en),
            (TrackerType::TrackerEvent, ev),
        ],
    );
    importer.import(&second, preheat);

    let store = importer.store();
    assert!(!store.file_resource(&old_file).unwrap().unwrap().assigned);
    assert_eq!(store.file_resource(&new_file).unwrap().unwrap().owner, Some(ev));
}

#[test]
fn unaudited_type_writes_no_change_logs() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let te = Uid::generate();

    let mut b = bundle(ImportParams::default());
    let mut payload = f.tracked_entity(te, &[(f.text_attr, "Crate of salt")]);
    payload.tracked_entity_type = f.quiet_te_type;
    b.tracked_entities.push(payload);
    importer.import(&b, f.preheat());

    let store = importer.store();
    assert_eq!(tracked_entity(store, &te).attribute_values.len(), 1);
    assert!(store.change_logs(TrackerType::TrackedEntity, &te).unwrap().is_empty());
}

#[test]
fn generated_attribute_consumes_its_reserved_value() {
    let f = Fixture::new();
    let (importer, _rx) = importer();
    let mut reserved = InMemoryReservedValues::new();
    reserved.reserve(PATTERN, "4711");
    let mut importer = importer.with_reserved_values(reserved);

    let mut b = bundle(ImportParams::default());
    b.tracked_entities
        .push(f.tracked_entity(Uid::generate(), &[(f.generated_attr, "4711")]));
    let report = importer.import(&b, f.preheat());

    assert_eq!(report.status, ImportStatus::Ok);
    assert!(importer.reserved_values().is_used(PATTERN, "4711"));
    assert!(!importer.reserved_values().is_reserved(PATTERN, "4711"));
}

#[test]
fn rolled_back_run_leaves_reserved_value_unused() {
    let f = Fixture::new();
    let (importer, _rx) = importer();
    let mut reserved = InMemoryReservedValues::new();
    reserved.reserve(PATTERN, "4711");
    let mut importer = importer.with_reserved_values(reserved);
    let te = Uid::generate();

    let mut broken = bundle(ImportParams::default());
    broken
        .tracked_entities
        .push(f.tracked_entity(te, &[(f.generated_attr, "4711")]));
    broken
        .tracker_events
        .push(f.event(Uid::generate(), Uid::generate(), EventStatus::Active, &[]));
    assert_eq!(importer.import(&broken, f.preheat()).status, ImportStatus::Error);
    assert!(!importer.reserved_values().is_used(PATTERN, "4711"));
    assert!(importer.reserved_values().is_reserved(PATTERN, "4711"));

    let mut retry = bundle(ImportParams::default());
    retry
        .tracked_entities
        .push(f.tracked_entity(te, &[(f.generated_attr, "4711")]));
    let report = importer.import(&retry, f.preheat());

    assert_eq!(report.status, ImportStatus::Ok);
    assert!(importer.reserved_values().is_used(PATTERN, "4711"));
}

#[test]
fn ignored_object_releases_its_reserved_value() {
    let f = Fixture::new();
    let (importer, _rx) = importer();
    let mut reserved = InMemoryReservedValues::new();
    reserved.reserve(PATTERN, "4711");
    let mut importer = importer.with_reserved_values(reserved);
    // generated after the fixture, so its values are applied after the generated one
    let unknown_attr = Uid::generate();

    let mut b = bundle(ImportParams::default().with_atomic_mode(AtomicMode::Object));
    b.tracked_entities.push(f.tracked_entity(
        Uid::generate(),
        &[(f.generated_attr, "4711"), (unknown_attr, "x")],
    ));
    let kept = Uid::generate();
    b.tracked_entities
        .push(f.tracked_entity(kept, &[(f.generated_attr, "4711")]));
    let report = importer.import(&b, f.preheat());

    let tes = report.type_report(TrackerType::TrackedEntity).unwrap();
    assert_eq!((tes.stats.created, tes.stats.ignored), (1, 1));
    assert_eq!(tes.uids(Outcome::Created), vec![kept]);
    assert!(importer.reserved_values().is_used(PATTERN, "4711"));
    assert!(!importer.reserved_values().is_reserved(PATTERN, "4711"));
}

#[test]
fn value_used_twice_is_recorded_once() {
    let mut reserved = InMemoryReservedValues::new();
    reserved.reserve(PATTERN, "0042");
    reserved.use_reserved_value(PATTERN, "0042").unwrap();
    reserved.use_reserved_value(PATTERN, "0042").unwrap();
    // typed in by hand, never reserved
    reserved.use_reserved_value(PATTERN, "9999").unwrap();

    assert!(reserved.is_used(PATTERN, "0042"));
    assert!(reserved.is_used(PATTERN, "9999"));
    assert!(!reserved.is_reserved(PATTERN, "0042"));
    assert!(!reserved.is_used("OTHER", "0042"));
}

// ── Enrollments ──────────────────────────────────────────────────

#[test]
fn ownership_is_created_once_per_program() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let te = Uid::generate();

    let mut b = bundle(ImportParams::default());
    b.tracked_entities.push(f.tracked_entity(te, &[]));
    b.enrollments.push(f.enrollment(Uid::generate(), te));
    b.enrollments.push(f.enrollment(Uid::generate(), te));
    let report = importer.import(&b, f.preheat());

    assert_eq!(report.status, ImportStatus::Ok);
    assert_eq!(importer.store().ownerships().unwrap().len(), 1);
}

#[test]
fn program_attributes_only_touch_submitted_keys() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (te, en) = (Uid::generate(), Uid::generate());

    let mut first = bundle(ImportParams::default());
    first
        .tracked_entities
        .push(f.tracked_entity(te, &[(f.text_attr, "Ada"), (f.second_attr, "King")]));
    importer.import(&first, f.preheat());

    let mut second = bundle(ImportParams::default());
    let mut payload = f.enrollment(en, te);
    payload.attributes.push(dto::Attribute {
        attribute: f.text_attr,
        value: Some("Augusta".into()),
    });
    second.enrollments.push(payload);
    let preheat = f.reload(importer.store(), &[(TrackerType::TrackedEntity, te)]);
    importer.import(&second, preheat);

    let values = tracked_entity(importer.store(), &te).attribute_values;
    assert_eq!(values[&f.text_attr].value, "Augusta");
    assert_eq!(values[&f.second_attr].value, "King");
}

#[test]
fn notes_are_appended_once() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (te, en) = (Uid::generate(), Uid::generate());
    let first_note = note("Referred by clinic");

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(te, &[]));
    let mut payload = f.enrollment(en, te);
    payload.notes.push(first_note.clone());
    first.enrollments.push(payload.clone());
    importer.import(&first, f.preheat());

    payload.notes.push(note("Follow-up booked"));
    let mut second = bundle(ImportParams::default());
    second.enrollments.push(payload);
    let preheat = f.reload(
        importer.store(),
        &[(TrackerType::TrackedEntity, te), (TrackerType::Enrollment, en)],
    );
    importer.import(&second, preheat);

    let notes: Vec<String> = enrollment(importer.store(), &en)
        .notes
        .into_iter()
        .map(|n| n.value)
        .collect();
    assert_eq!(notes, vec!["Referred by clinic", "Follow-up booked"]);
}

// ── Relationships ────────────────────────────────────────────────

#[test]
fn resubmitted_relationship_is_ignored() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();
    let (mother, child) = (Uid::generate(), Uid::generate());
    let link = f.relationship(
        f.rel_type,
        RelationshipItem::TrackedEntity(mother),
        RelationshipItem::TrackedEntity(child),
    );

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(mother, &[]));
    first.tracked_entities.push(f.tracked_entity(child, &[]));
    first.relationships.push(link.clone());
    let report = importer.import(&first, f.preheat());
    assert_eq!(report.type_report(TrackerType::Relationship).unwrap().stats.created, 1);
    let created = report
        .type_report(TrackerType::Relationship)
        .unwrap()
        .uids(Outcome::Created)[0];
    drain(&mut rx);

    let mut second = bundle(ImportParams::default());
    second.relationships.push(link);
    let preheat = f.reload(
        importer.store(),
        &[
            (TrackerType::TrackedEntity, mother),
            (TrackerType::TrackedEntity, child),
            (TrackerType::Relationship, created),
        ],
    );
    let report = importer.import(&second, preheat);

    let stats = report.type_report(TrackerType::Relationship).unwrap().stats;
    assert_eq!((stats.created, stats.updated, stats.ignored), (0, 0, 1));
    assert_eq!(report.status, ImportStatus::Warning);
    assert_eq!(
        importer
            .store()
            .relationships_touching(&RelationshipItem::TrackedEntity(mother))
            .unwrap()
            .len(),
        1
    );
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn bidirectional_relationship_matches_its_inverse() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (a, b_uid) = (Uid::generate(), Uid::generate());

    let mut b = bundle(ImportParams::default());
    b.tracked_entities.push(f.tracked_entity(a, &[]));
    b.tracked_entities.push(f.tracked_entity(b_uid, &[]));
    b.relationships.push(f.relationship(
        f.bidirectional_type,
        RelationshipItem::TrackedEntity(a),
        RelationshipItem::TrackedEntity(b_uid),
    ));
    b.relationships.push(f.relationship(
        f.bidirectional_type,
        RelationshipItem::TrackedEntity(b_uid),
        RelationshipItem::TrackedEntity(a),
    ));
    let report = importer.import(&b, f.preheat());

    let stats = report.type_report(TrackerType::Relationship).unwrap().stats;
    assert_eq!((stats.created, stats.ignored), (1, 1));
}

#[test]
fn new_relationship_restamps_the_from_side() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (mother, child) = (Uid::generate(), Uid::generate());

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(mother, &[]));
    first.tracked_entities.push(f.tracked_entity(child, &[]));
    importer.import(&first, f.preheat());

    let nurse = UserInfo::new(Uid::generate(), "nurse");
    let mut second = bundle(ImportParams::default().with_user(nurse.clone()));
    second.relationships.push(f.relationship(
        f.rel_type,
        RelationshipItem::TrackedEntity(mother),
        RelationshipItem::TrackedEntity(child),
    ));
    let preheat = f.reload(
        importer.store(),
        &[
            (TrackerType::TrackedEntity, mother),
            (TrackerType::TrackedEntity, child),
        ],
    );
    importer.import(&second, preheat);

    let store = importer.store();
    assert_eq!(tracked_entity(store, &mother).audit.last_updated_by, nurse);
    assert_eq!(
        tracked_entity(store, &child).audit.last_updated_by,
        UserInfo::system()
    );
}

#[test]
fn updating_an_event_restamps_its_tracked_entity() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (te, en, ev) = (Uid::generate(), Uid::generate(), Uid::generate());

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(te, &[]));
    first.enrollments.push(f.enrollment(en, te));
    first.tracker_events.push(f.event(ev, en, EventStatus::Active, &[]));
    importer.import(&first, f.preheat());

    let clerk = UserInfo::new(Uid::generate(), "clerk");
    let mut second = bundle(ImportParams::default().with_user(clerk.clone()));
    second
        .tracker_events
        .push(f.event(ev, en, EventStatus::Active, &[(f.text_de, "4.0")]));
    let preheat = f.reload(
        importer.store(),
        &[
            (TrackerType::TrackedEntity, te),
            (TrackerType::Enrollment, en),
            (TrackerType::TrackerEvent, ev),
        ],
    );
    importer.import(&second, preheat);

    assert_eq!(tracked_entity(importer.store(), &te).audit.last_updated_by, clerk);
}

// ── Notifications ────────────────────────────────────────────────

#[test]
fn completing_an_event_triggers_once() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();
    let (te, en, ev) = (Uid::generate(), Uid::generate(), Uid::generate());

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(te, &[]));
    first.enrollments.push(f.enrollment(en, te));
    first.tracker_events.push(f.event(ev, en, EventStatus::Active, &[]));
    importer.import(&first, f.preheat());
    drain(&mut rx);

    let objects = [
        (TrackerType::TrackedEntity, te),
        (TrackerType::Enrollment, en),
        (TrackerType::TrackerEvent, ev),
    ];
    let mut completed = bundle(ImportParams::default());
    completed
        .tracker_events
        .push(f.event(ev, en, EventStatus::Completed, &[]));

    importer.import(&completed, f.reload(importer.store(), &objects));
    let descriptors = drain(&mut rx);
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].triggers, vec![NotificationTrigger::EventCompletion]);

    importer.import(&completed, f.reload(importer.store(), &objects));
    let descriptors = drain(&mut rx);
    assert_eq!(descriptors.len(), 1);
    assert!(descriptors[0].triggers.is_empty());
}

#[test]
fn new_completed_single_event_triggers() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();

    let mut b = bundle(ImportParams::default());
    b.single_events
        .push(f.single_event(Uid::generate(), EventStatus::Completed));
    importer.import(&b, f.preheat());

    let descriptors = drain(&mut rx);
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].tracker_type, TrackerType::SingleEvent);
    assert_eq!(descriptors[0].triggers, vec![NotificationTrigger::EventCompletion]);
}

#[test]
fn skipped_side_effects_send_nothing() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();

    let mut b = bundle(ImportParams::default().with_skip_side_effects(true));
    b.single_events
        .push(f.single_event(Uid::generate(), EventStatus::Completed));
    let report = importer.import(&b, f.preheat());

    assert_eq!(report.status, ImportStatus::Ok);
    assert!(drain(&mut rx).is_empty());
}

// ── Atomicity and flushing ───────────────────────────────────────

/// Three events where the second points at an enrollment that does not exist.
fn bundle_with_broken_second_event(f: &Fixture, params: ImportParams) -> (TrackerBundle, Uid, Uid) {
    let (te, en) = (Uid::generate(), Uid::generate());
    let mut b = bundle(params);
    b.tracked_entities.push(f.tracked_entity(te, &[]));
    b.enrollments.push(f.enrollment(en, te));
    b.tracker_events.push(f.event(Uid::generate(), en, EventStatus::Active, &[]));
    b.tracker_events
        .push(f.event(Uid::generate(), Uid::generate(), EventStatus::Active, &[]));
    b.tracker_events.push(f.event(Uid::generate(), en, EventStatus::Active, &[]));
    (b, te, en)
}

#[test]
fn all_mode_failure_rolls_back_every_type() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();
    let (b, te, en) = bundle_with_broken_second_event(&f, ImportParams::default());

    let report = importer.import(&b, f.preheat());

    assert_eq!(report.status, ImportStatus::Error);
    assert!(report.message.is_some());
    assert_eq!(report.stats().total(), 0);
    let events = report.type_report(TrackerType::TrackerEvent).unwrap();
    assert_eq!((events.stats.created, events.stats.updated), (0, 0));

    let store = importer.store();
    assert!(!store.in_transaction());
    assert!(store.get(TrackerType::TrackedEntity, &te).unwrap().is_none());
    assert!(store.get(TrackerType::Enrollment, &en).unwrap().is_none());
    assert!(store.events_of(&en).unwrap().is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn object_mode_failure_skips_only_the_broken_object() {
    let f = Fixture::new();
    let (mut importer, mut rx) = importer();
    let params = ImportParams::default().with_atomic_mode(AtomicMode::Object);
    let (b, _te, en) = bundle_with_broken_second_event(&f, params);

    let report = importer.import(&b, f.preheat());

    assert_eq!(report.status, ImportStatus::Warning);
    let events = report.type_report(TrackerType::TrackerEvent).unwrap();
    assert_eq!((events.stats.created, events.stats.ignored), (2, 1));
    assert_eq!(events.entries[1].outcome, Outcome::Ignored);
    assert_eq!(events.entries[1].index, 1);
    assert!(events.entries[1].message.is_some());

    assert_eq!(importer.store().events_of(&en).unwrap().len(), 2);
    assert_eq!(drain(&mut rx).len(), 4);
}

#[test]
fn object_mode_rolls_back_preheat_of_a_failed_object() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let params = ImportParams::default().with_atomic_mode(AtomicMode::Object);
    let orphan = Uid::generate();
    let dangling_enrollment = Uid::generate();

    // The enrollment fails at flush, so the event under it fails too.
    let mut b = bundle(params);
    b.enrollments.push(f.enrollment(dangling_enrollment, orphan));
    b.tracker_events
        .push(f.event(Uid::generate(), dangling_enrollment, EventStatus::Active, &[]));
    let report = importer.import(&b, f.preheat());

    assert_eq!(report.type_report(TrackerType::Enrollment).unwrap().stats.ignored, 1);
    assert_eq!(report.type_report(TrackerType::TrackerEvent).unwrap().stats.ignored, 1);
    assert!(importer.store().ownerships().unwrap().is_empty());
}

#[test]
fn flush_per_object_checks_each_object() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let mut b = bundle(ImportParams::default().with_flush_mode(FlushMode::Object));
    for _ in 0..3 {
        b.tracked_entities.push(f.tracked_entity(Uid::generate(), &[]));
    }
    importer.import(&b, f.preheat());
    // three objects plus the commit
    assert_eq!(importer.store().flush_count(), 4);

    let mut auto = b;
    auto.params = ImportParams::default();
    let (mut batched, _rx) = common::importer();
    batched.import(&auto, f.preheat());
    assert_eq!(batched.store().flush_count(), 1);
}

#[test]
fn missing_metadata_is_ignored_in_object_mode() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let params = ImportParams::default().with_atomic_mode(AtomicMode::Object);
    let mut b = bundle(params);
    b.tracked_entities
        .push(f.tracked_entity(Uid::generate(), &[(Uid::generate(), "unknown")]));
    b.tracked_entities.push(f.tracked_entity(Uid::generate(), &[]));

    let report = importer.import(&b, f.preheat());
    let stats = report.type_report(TrackerType::TrackedEntity).unwrap().stats;
    assert_eq!((stats.created, stats.ignored), (1, 1));
}

// ── Delete strategy ──────────────────────────────────────────────

#[test]
fn delete_strategy_routes_to_deletion() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let (te, en) = (Uid::generate(), Uid::generate());

    let mut first = bundle(ImportParams::default());
    first.tracked_entities.push(f.tracked_entity(te, &[]));
    first.enrollments.push(f.enrollment(en, te));
    importer.import(&first, f.preheat());

    let mut delete = bundle(
        ImportParams::default().with_import_strategy(ImportStrategy::Delete),
    );
    delete.tracked_entities.push(f.tracked_entity(te, &[]));
    let report = importer.import(&delete, f.preheat());

    assert_eq!(report.status, ImportStatus::Ok);
    assert_eq!(report.type_report(TrackerType::TrackedEntity).unwrap().stats.deleted, 1);
    assert_eq!(report.type_report(TrackerType::Enrollment).unwrap().stats.deleted, 1);
    assert!(tracked_entity(importer.store(), &te).deleted);
}

#[test]
fn delete_strategy_with_unknown_uid_reports_error() {
    let f = Fixture::new();
    let (mut importer, _rx) = importer();
    let mut delete = bundle(
        ImportParams::default().with_import_strategy(ImportStrategy::Delete),
    );
    delete.tracked_entities.push(f.tracked_entity(Uid::generate(), &[]));

    let report = importer.import(&delete, f.preheat());
    assert_eq!(report.status, ImportStatus::Error);
    assert!(!importer.store().in_transaction());
}
