//! Shared fixtures for import and deletion tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;
use tracker_import::{
    ChannelDispatcher, ImportParams, NotificationDescriptor, Preheat, TrackerBundle,
    TrackerImporter,
};
use tracker_model::dto::{self, Attribute, DataValue, Note};
use tracker_model::{
    DataElement, FileResource, NotificationInstance, Program, ProgramStage, RelationshipItem,
    RelationshipType, TrackedEntityAttribute, TrackedEntityType, TrackerEntity,
};
use tracker_storage::{
    EntityStore, FileResourceStore, NotificationStore, SqliteStore, Transactional,
};
use tracker_types::{EnrollmentStatus, EventStatus, TrackerType, Uid, ValueType};

pub const PATTERN: &str = "RANDOM(####)";

/// Metadata uids shared by every payload a test builds.
pub struct Fixture {
    pub te_type: Uid,
    pub quiet_te_type: Uid,
    pub program: Uid,
    pub stage: Uid,
    pub single_program: Uid,
    pub single_stage: Uid,
    pub text_attr: Uid,
    pub second_attr: Uid,
    pub file_attr: Uid,
    pub generated_attr: Uid,
    pub text_de: Uid,
    pub file_de: Uid,
    pub rel_type: Uid,
    pub bidirectional_type: Uid,
    pub org_unit: Uid,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            te_type: Uid::generate(),
            quiet_te_type: Uid::generate(),
            program: Uid::generate(),
            stage: Uid::generate(),
            single_program: Uid::generate(),
            single_stage: Uid::generate(),
            text_attr: Uid::generate(),
            second_attr: Uid::generate(),
            file_attr: Uid::generate(),
            generated_attr: Uid::generate(),
            text_de: Uid::generate(),
            file_de: Uid::generate(),
            rel_type: Uid::generate(),
            bidirectional_type: Uid::generate(),
            org_unit: Uid::generate(),
        }
    }

    /// A preheat holding metadata only.
    pub fn preheat(&self) -> Preheat {
        let mut preheat = Preheat::new();
        preheat.add_tracked_entity_type(TrackedEntityType {
            uid: self.te_type,
            name: "Person".into(),
            allow_audit_log: true,
        });
        preheat.add_tracked_entity_type(TrackedEntityType {
            uid: self.quiet_te_type,
            name: "Commodity".into(),
            allow_audit_log: false,
        });
        preheat.add_program(Program {
            uid: self.program,
            name: "Child programme".into(),
            allow_audit_log: true,
        });
        preheat.add_program(Program {
            uid: self.single_program,
            name: "Inpatient morbidity".into(),
            allow_audit_log: false,
        });
        preheat.add_program_stage(ProgramStage {
            uid: self.stage,
            name: "Birth".into(),
            program: self.program,
        });
        preheat.add_program_stage(ProgramStage {
            uid: self.single_stage,
            name: "Admission".into(),
            program: self.single_program,
        });
        for (uid, name, value_type, generated) in [
            (self.text_attr, "First name", ValueType::Text, false),
            (self.second_attr, "Last name", ValueType::Text, false),
            (self.file_attr, "Photo", ValueType::Image, false),
            (self.generated_attr, "Unique id", ValueType::Text, true),
        ] {
            preheat.add_attribute(TrackedEntityAttribute {
                uid,
                name: name.into(),
                value_type,
                generated,
                text_pattern: generated.then(|| PATTERN.to_string()),
            });
        }
        preheat.add_data_element(DataElement {
            uid: self.text_de,
            name: "Weight".into(),
            value_type: ValueType::Number,
        });
        preheat.add_data_element(DataElement {
            uid: self.file_de,
            name: "Scan".into(),
            value_type: ValueType::FileResource,
        });
        preheat.add_relationship_type(RelationshipType {
            uid: self.rel_type,
            name: "Mother to child".into(),
            bidirectional: false,
        });
        preheat.add_relationship_type(RelationshipType {
            uid: self.bidirectional_type,
            name: "Sibling".into(),
            bidirectional: true,
        });
        preheat
    }

    /// A preheat with metadata plus the stored state of the given objects.
    pub fn reload(&self, store: &SqliteStore, objects: &[(TrackerType, Uid)]) -> Preheat {
        let mut preheat = self.preheat();
        for (tracker_type, uid) in objects {
            let Some(entity) = store.get(*tracker_type, uid).unwrap() else {
                continue;
            };
            if let TrackerEntity::Enrollment(enrollment) = &entity {
                if let Some(ownership) = store
                    .ownership(&enrollment.tracked_entity, &enrollment.program)
                    .unwrap()
                {
                    preheat.add_ownership(
                        ownership.tracked_entity,
                        ownership.program,
                        ownership.org_unit,
                    );
                }
            }
            preheat.put(entity);
        }
        preheat
    }

    pub fn tracked_entity(&self, uid: Uid, attributes: &[(Uid, &str)]) -> dto::TrackedEntity {
        dto::TrackedEntity {
            uid,
            tracked_entity_type: self.te_type,
            org_unit: self.org_unit,
            attributes: attributes
                .iter()
                .map(|(attribute, value)| Attribute {
                    attribute: *attribute,
                    value: Some(value.to_string()),
                })
                .collect(),
        }
    }

    pub fn enrollment(&self, uid: Uid, tracked_entity: Uid) -> dto::Enrollment {
        dto::Enrollment {
            uid,
            tracked_entity,
            program: self.program,
            org_unit: self.org_unit,
            status: EnrollmentStatus::Active,
            enrolled_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            attributes: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn event(&self, uid: Uid, enrollment: Uid, status: EventStatus, values: &[(Uid, &str)]) -> dto::TrackerEvent {
        dto::TrackerEvent {
            uid,
            enrollment,
            program_stage: self.stage,
            org_unit: self.org_unit,
            status,
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
            data_values: values
                .iter()
                .map(|(data_element, value)| DataValue {
                    data_element: *data_element,
                    value: Some(value.to_string()),
                })
                .collect(),
            notes: Vec::new(),
        }
    }

    pub fn single_event(&self, uid: Uid, status: EventStatus) -> dto::SingleEvent {
        dto::SingleEvent {
            uid,
            program_stage: self.single_stage,
            org_unit: self.org_unit,
            status,
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 3, 9, 0, 0).unwrap(),
            data_values: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn relationship(&self, relationship_type: Uid, from: RelationshipItem, to: RelationshipItem) -> dto::Relationship {
        dto::Relationship {
            uid: None,
            relationship_type,
            from,
            to,
        }
    }
}

/// Routes log output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init();
}

pub fn note(value: &str) -> Note {
    Note {
        uid: Uid::generate(),
        value: value.into(),
    }
}

pub fn importer() -> (
    TrackerImporter<SqliteStore>,
    UnboundedReceiver<NotificationDescriptor>,
) {
    let (dispatcher, receiver) = ChannelDispatcher::channel();
    let store = SqliteStore::open_in_memory().unwrap();
    (TrackerImporter::new(store, dispatcher), receiver)
}

pub fn bundle(params: ImportParams) -> TrackerBundle {
    TrackerBundle::new(params)
}

pub fn drain(receiver: &mut UnboundedReceiver<NotificationDescriptor>) -> Vec<NotificationDescriptor> {
    let mut out = Vec::new();
    while let Ok(descriptor) = receiver.try_recv() {
        out.push(descriptor);
    }
    out
}

/// Registers unassigned file resources directly in storage.
pub fn seed_files(store: &mut SqliteStore, files: &[Uid]) {
    store.begin().unwrap();
    for uid in files {
        store
            .save_file_resource(&FileResource::unassigned(*uid, format!("{uid}.png")))
            .unwrap();
    }
    store.commit().unwrap();
}

pub fn seed_notification(store: &mut SqliteStore, owner_type: TrackerType, owner: Uid) {
    store.begin().unwrap();
    store
        .save_notification_instance(&NotificationInstance {
            uid: Uid::generate(),
            owner_type,
            owner,
            template: Uid::generate(),
            scheduled_at: Utc::now(),
        })
        .unwrap();
    store.commit().unwrap();
}
