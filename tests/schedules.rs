#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use roulement::schedule::{RotationEntry, ScheduleManager, ScheduleUpdate};
use roulement::storage::{Planning, Workspace};
use roulement::template::NewTemplate;
use roulement::{
    Employee, EngineConfig, MemorySink, NotificationType, PlanError, ScheduleKind,
    ScheduleStatus, ShiftAssignment, ShiftSchedule,
};
use std::sync::Arc;

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn setup() -> (Workspace, Arc<MemorySink>, Employee, Employee) {
    let sink = Arc::new(MemorySink::new());
    let workspace = Workspace::empty(EngineConfig::default(), sink.clone());
    workspace
        .catalog
        .create(NewTemplate {
            code: "MAT".to_string(),
            name: "Matin".to_string(),
            description: None,
            start: t(6),
            end: t(14),
            break_start: None,
            break_end: None,
            overtime_eligible: false,
            sort_order: 0,
        })
        .unwrap();
    let alice = Employee::new("alice", "Alice Martin");
    let bob = Employee::new("bob", "Bob Durand");
    workspace.store.add_employee(alice.clone()).unwrap();
    workspace.store.add_employee(bob.clone()).unwrap();
    (workspace, sink, alice, bob)
}

#[test]
fn draft_publish_archive_lifecycle() {
    let (ws, sink, alice, _) = setup();
    let schedule = ws
        .schedules
        .create("Mars S1", d(2), d(8), ScheduleKind::Primary, alice.id.clone())
        .unwrap();
    assert_eq!(schedule.status, ScheduleStatus::Draft);
    sink.take();

    let published = ws
        .schedules
        .publish(&schedule.id, alice.id.clone(), Utc::now())
        .unwrap();
    assert_eq!(published.status, ScheduleStatus::Published);
    assert!(published.published_at.is_some());

    // la période n'est pas écoulée : archivage refusé sans force
    let early = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
    assert!(matches!(
        ws.schedules.archive(&schedule.id, early, false),
        Err(PlanError::Validation(_))
    ));
    let archived = ws
        .schedules
        .archive(&schedule.id, early, true)
        .unwrap();
    assert_eq!(archived.status, ScheduleStatus::Archived);

    // un planning archivé ne se republie pas
    assert!(matches!(
        ws.schedules.publish(&schedule.id, alice.id, Utc::now()),
        Err(PlanError::InvalidTransition(_))
    ));
}

#[test]
fn draft_cannot_be_archived_directly() {
    let (ws, _, alice, _) = setup();
    let schedule = ws
        .schedules
        .create("Mars S1", d(2), d(8), ScheduleKind::Primary, alice.id)
        .unwrap();
    assert!(matches!(
        ws.schedules.archive(&schedule.id, Utc::now(), true),
        Err(PlanError::InvalidTransition(_))
    ));
}

#[test]
fn primary_schedules_are_exclusive_extras_stack() {
    let (ws, _, alice, _) = setup();
    ws.schedules
        .create("Mars S1", d(2), d(8), ScheduleKind::Primary, alice.id.clone())
        .unwrap();
    let err = ws
        .schedules
        .create("Doublon", d(5), d(12), ScheduleKind::Primary, alice.id.clone())
        .unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));

    // un planning Extra se superpose librement
    ws.schedules
        .create("Renfort", d(5), d(12), ScheduleKind::Extra, alice.id)
        .unwrap();
}

#[test]
fn only_drafts_are_editable() {
    let (ws, _, alice, _) = setup();
    let schedule = ws
        .schedules
        .create("Mars S1", d(2), d(8), ScheduleKind::Primary, alice.id.clone())
        .unwrap();
    ws.schedules
        .update(
            &schedule.id,
            ScheduleUpdate {
                name: Some("Mars semaine 1".to_string()),
                ..ScheduleUpdate::default()
            },
        )
        .unwrap();
    ws.schedules
        .publish(&schedule.id, alice.id, Utc::now())
        .unwrap();
    assert!(matches!(
        ws.schedules.update(
            &schedule.id,
            ScheduleUpdate {
                name: Some("trop tard".to_string()),
                ..ScheduleUpdate::default()
            },
        ),
        Err(PlanError::InvalidTransition(_))
    ));
}

#[test]
fn weekly_generation_fills_rotation_and_reports_skips() {
    let (ws, sink, alice, bob) = setup();
    let rotation = [
        RotationEntry {
            employee: alice.id.clone(),
            template_code: "MAT".to_string(),
        },
        RotationEntry {
            employee: bob.id.clone(),
            template_code: "MAT".to_string(),
        },
    ];
    sink.take();
    let report = ws
        .schedules
        .generate_weekly("Mars S1", d(2), &rotation, alice.id.clone(), Utc::now())
        .unwrap();
    // 7 jours x 8h : le plafond de 48h par semaine stoppe chacun au 6e jour
    assert_eq!(report.created, 12);
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped.iter().all(|s| s.date == d(8)));
    assert_eq!(report.schedule.assignment_count, 12);

    // le planning généré se publie : aucune affectation en conflit
    let published = ws
        .schedules
        .publish(&report.schedule.id, alice.id, Utc::now())
        .unwrap();
    assert_eq!(published.status, ScheduleStatus::Published);
    let events = sink.take();
    assert!(events
        .iter()
        .any(|e| e.kind == NotificationType::SchedulePublished));
}

#[test]
fn publish_refuses_a_schedule_with_conflicting_assignments() {
    // État persisté corrompu (ou produit par un autre outil) : deux vacations
    // qui se chevauchent pour le même employé. La publication doit refuser.
    let alice = Employee::new("alice", "Alice Martin");
    let schedule = ShiftSchedule::new(
        "Mars S1",
        d(2),
        d(8),
        ScheduleKind::Primary,
        alice.id.clone(),
    )
    .unwrap();
    let mut a = ShiftAssignment::new(alice.id.clone(), d(2), t(6), t(14)).unwrap();
    a.schedule = Some(schedule.id.clone());
    let mut b = ShiftAssignment::new(alice.id.clone(), d(2), t(10), t(18)).unwrap();
    b.schedule = Some(schedule.id.clone());

    let planning = Planning {
        employees: vec![alice.clone()],
        templates: Vec::new(),
        assignments: vec![a, b],
        schedules: vec![schedule.clone()],
        swap_requests: Vec::new(),
    };
    let ws = Workspace::from_planning(
        planning,
        EngineConfig::default(),
        Arc::new(MemorySink::new()),
    );
    let err = ws
        .schedules
        .publish(&schedule.id, alice.id, Utc::now())
        .unwrap_err();
    match err {
        PlanError::Conflict(result) => assert!(result.has_conflict()),
        other => panic!("expected Conflict, got {other:?}"),
    }
    assert_eq!(
        ws.schedules.get(&schedule.id).unwrap().status,
        ScheduleStatus::Draft
    );
}

#[test]
fn monthly_generation_covers_the_calendar_month() {
    let (ws, _, alice, bob) = setup();
    // un seul poste, en alternant manuellement les deux employés par
    // quinzaine, resterait sous les plafonds ; ici on vérifie seulement les
    // bornes du planning généré.
    let rotation = [RotationEntry {
        employee: bob.id,
        template_code: "MAT".to_string(),
    }];
    let report = ws
        .schedules
        .generate_monthly("Mars", d(15), &rotation, alice.id, Utc::now())
        .unwrap();
    assert_eq!(report.schedule.start_date, d(1));
    assert_eq!(report.schedule.end_date, d(31));
}

#[test]
fn manager_is_rebuilt_from_snapshot() {
    let (ws, sink, alice, _) = setup();
    let schedule = ws
        .schedules
        .create("Mars S1", d(2), d(8), ScheduleKind::Primary, alice.id)
        .unwrap();
    let snapshot = ws.schedules.snapshot();
    let rebuilt = ScheduleManager::from_parts(snapshot, ws.store.clone(), sink);
    assert_eq!(rebuilt.get(&schedule.id).unwrap().name, "Mars S1");
}
