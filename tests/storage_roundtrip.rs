#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use roulement::storage::{JsonStorage, Storage, Workspace};
use roulement::swap::NewSwapRequest;
use roulement::template::NewTemplate;
use roulement::{
    Employee, EngineConfig, MemorySink, NewAssignment, Priority, ScheduleKind, SwapStatus,
};
use std::sync::Arc;

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

#[test]
fn planning_survives_a_save_and_load_cycle() {
    let sink = Arc::new(MemorySink::new());
    let ws = Workspace::empty(EngineConfig::default(), sink.clone());
    ws.catalog
        .create(NewTemplate {
            code: "MAT".to_string(),
            name: "Matin".to_string(),
            description: Some("prise de poste 06:00".to_string()),
            start: t(6),
            end: t(14),
            break_start: Some(t(10)),
            break_end: Some(t(11)),
            overtime_eligible: true,
            sort_order: 1,
        })
        .unwrap();
    let alice = Employee::new("alice", "Alice Martin");
    let bob = Employee::new("bob", "Bob Durand");
    ws.store.add_employee(alice.clone()).unwrap();
    ws.store.add_employee(bob.clone()).unwrap();

    let clock = Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap();
    let offered = ws
        .store
        .create(
            NewAssignment {
                employee: alice.id.clone(),
                date: d(2),
                template: Some("MAT".to_string()),
                start: None,
                end: None,
                schedule: None,
                notes: Some("première semaine".to_string()),
            },
            clock,
        )
        .unwrap();
    let wanted = ws
        .store
        .create(
            NewAssignment {
                employee: bob.id.clone(),
                date: d(3),
                template: Some("MAT".to_string()),
                start: None,
                end: None,
                schedule: None,
                notes: None,
            },
            clock,
        )
        .unwrap();
    ws.swaps
        .create(
            NewSwapRequest {
                requester: alice.id.clone(),
                requester_assignment: offered.id.clone(),
                target_employee: bob.id.clone(),
                target_assignment: Some(wanted.id.clone()),
                priority: Priority::High,
                emergency: true,
                reason: Some("urgence familiale".to_string()),
                expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            },
            clock,
        )
        .unwrap();
    ws.schedules
        .create("Mars S1", d(2), d(8), ScheduleKind::Primary, alice.id.clone())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planning.json");
    let storage = JsonStorage::open(&path).unwrap();
    storage.save(&ws.to_planning()).unwrap();

    let reloaded = storage.load().unwrap();
    let ws2 = Workspace::from_planning(reloaded, EngineConfig::default(), sink);

    let template = ws2.catalog.get("MAT").unwrap();
    assert!(template.referenced);
    assert_eq!(template.break_minutes(), 60);

    let roundtrip = ws2.store.get(&offered.id).unwrap();
    assert_eq!(roundtrip.employee, alice.id);
    assert_eq!(roundtrip.break_minutes, 60);
    assert_eq!(roundtrip.notes.as_deref(), Some("première semaine"));

    assert_eq!(ws2.store.employees().len(), 2);
    assert_eq!(ws2.schedules.snapshot().len(), 1);
    let requests = ws2.swaps.snapshot();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, SwapStatus::Pending);
    assert!(requests[0].emergency);
}

#[test]
fn loading_a_missing_file_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("absent.json")).unwrap();
    assert!(storage.load().is_err());
}
