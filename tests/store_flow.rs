#![forbid(unsafe_code)]
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use roulement::{
    AssignmentStatus, AttendanceStatus, ConflictEngine, ConflictType, Employee, EngineConfig,
    MemorySink, NewAssignment, NotificationType, PlanError, TemplateCatalog,
};
use roulement::store::AssignmentStore;
use roulement::template::NewTemplate;
use std::sync::Arc;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap()
}

fn setup() -> (Arc<AssignmentStore>, Arc<MemorySink>, Employee, Employee) {
    let catalog = Arc::new(TemplateCatalog::new());
    catalog
        .create(NewTemplate {
            code: "MAT".to_string(),
            name: "Matin".to_string(),
            description: None,
            start: t(6, 0),
            end: t(14, 0),
            break_start: None,
            break_end: None,
            overtime_eligible: false,
            sort_order: 0,
        })
        .unwrap();
    let sink = Arc::new(MemorySink::new());
    let store = Arc::new(AssignmentStore::new(
        catalog,
        ConflictEngine::new(EngineConfig::default()),
        sink.clone(),
    ));
    let alice = Employee::new("alice", "Alice Martin");
    let bob = Employee::new("bob", "Bob Durand");
    store.add_employee(alice.clone()).unwrap();
    store.add_employee(bob.clone()).unwrap();
    (store, sink, alice, bob)
}

fn assign(store: &AssignmentStore, employee: &Employee, day: u32) -> roulement::ShiftAssignment {
    store
        .create(
            NewAssignment {
                employee: employee.id.clone(),
                date: d(day),
                template: Some("MAT".to_string()),
                start: None,
                end: None,
                schedule: None,
                notes: None,
            },
            now(),
        )
        .unwrap()
}

#[test]
fn create_snapshots_template_fields_and_notifies() {
    let (store, sink, alice, _) = setup();
    let a = assign(&store, &alice, 2);
    assert_eq!(a.template_code.as_deref(), Some("MAT"));
    assert_eq!(a.planned_minutes, 480);
    assert_eq!(a.status, AssignmentStatus::Scheduled);
    // le template est désormais figé
    assert!(store.catalog().get("MAT").unwrap().referenced);
    let events = sink.take();
    // l'événement porte l'horloge injectée, pas celle du système
    assert!(events.iter().any(|e| e.kind == NotificationType::AssignmentCreated
        && e.recipient == alice.id
        && e.at == now()));
}

#[test]
fn overlapping_creation_is_refused_with_the_full_result() {
    let (store, _, alice, _) = setup();
    assign(&store, &alice, 2);
    let err = store
        .create(
            NewAssignment {
                employee: alice.id.clone(),
                date: d(2),
                template: None,
                start: Some(t(10, 0)),
                end: Some(t(18, 0)),
                schedule: None,
                notes: None,
            },
            now(),
        )
        .unwrap_err();
    match err {
        PlanError::Conflict(result) => {
            assert!(result
                .conflicts
                .iter()
                .any(|c| c.kind == ConflictType::TimeOverlap));
        }
        other => panic!("expected Conflict, got {other:?}"),
    }
    // rien n'a été créé
    assert_eq!(store.by_employee(&alice.id).len(), 1);
}

#[test]
fn check_in_after_tolerance_is_late() {
    let (store, _, alice, _) = setup();
    let a = assign(&store, &alice, 2);
    let updated = store
        .check_in(&a.id, Utc.with_ymd_and_hms(2026, 3, 2, 6, 30, 0).unwrap())
        .unwrap();
    assert_eq!(updated.status, AssignmentStatus::CheckedIn);
    assert_eq!(updated.attendance, AttendanceStatus::Late);
}

#[test]
fn check_out_computes_actual_and_overtime() {
    let (store, _, alice, _) = setup();
    let a = assign(&store, &alice, 2);
    store
        .check_in(&a.id, Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap())
        .unwrap();
    let updated = store
        .check_out(&a.id, Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap())
        .unwrap();
    assert_eq!(updated.status, AssignmentStatus::Completed);
    assert_eq!(updated.actual_minutes, Some(570));
    assert_eq!(updated.overtime_minutes, 90);
}

#[test]
fn cancelled_assignment_cannot_be_checked_in() {
    let (store, sink, alice, _) = setup();
    let a = assign(&store, &alice, 2);
    sink.take();
    store.cancel(&a.id, "sick leave", now()).unwrap();
    let err = store
        .check_in(&a.id, Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap())
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidTransition(_)));
    let cancelled = store.get(&a.id).unwrap();
    assert_eq!(cancelled.status, AssignmentStatus::Cancelled);
    assert!(cancelled.notes.unwrap().contains("sick leave"));
    assert!(sink
        .take()
        .iter()
        .any(|e| e.kind == NotificationType::AssignmentCancelled));
}

#[test]
fn cancelled_window_is_reusable() {
    let (store, _, alice, _) = setup();
    let a = assign(&store, &alice, 2);
    store.cancel(&a.id, "sick leave", now()).unwrap();
    // la même fenêtre redevient libre
    assign(&store, &alice, 2);
}

#[test]
fn auto_assign_rotates_over_employees() {
    let (store, _, alice, bob) = setup();
    let report = store
        .auto_assign("MAT", &[d(2), d(3)], 1, None, now())
        .unwrap();
    assert_eq!(report.created.len(), 2);
    assert!(report.skipped.is_empty());
    let first = store.by_date(d(2));
    let second = store.by_date(d(3));
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first[0].employee, second[0].employee);
    assert!(first[0].employee == alice.id || first[0].employee == bob.id);
}

#[test]
fn copy_assignments_is_all_or_nothing() {
    let (store, _, alice, bob) = setup();
    assign(&store, &alice, 2);
    assign(&store, &bob, 2);
    // un obstacle dans la semaine cible pour alice
    store
        .create(
            NewAssignment {
                employee: alice.id.clone(),
                date: d(9),
                template: None,
                start: Some(t(8, 0)),
                end: Some(t(16, 0)),
                schedule: None,
                notes: None,
            },
            now(),
        )
        .unwrap();

    let before = store.snapshot().len();
    let err = store
        .copy_assignments(d(2), d(8), d(9), None, now())
        .unwrap_err();
    match err {
        PlanError::Conflict(result) => {
            assert!(result.summary.starts_with("copy aborted at source assignment"));
        }
        other => panic!("expected Conflict, got {other:?}"),
    }
    // aucune copie partielle
    assert_eq!(store.snapshot().len(), before);

    // sans l'obstacle, la copie passe entière
    let blocker = store
        .snapshot()
        .into_iter()
        .find(|a| a.date == d(9))
        .unwrap();
    store.cancel(&blocker.id, "cleared", now()).unwrap();
    let copies = store.copy_assignments(d(2), d(8), d(9), None, now()).unwrap();
    assert_eq!(copies.len(), 2);
    assert!(copies.iter().all(|c| c.date == d(9)));
}

#[test]
fn sweep_marks_unattended_past_shifts() {
    let (store, _, alice, _) = setup();
    let a = assign(&store, &alice, 2);
    let marked = store.sweep_no_shows(Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap(), 60);
    assert_eq!(marked, 1);
    assert_eq!(store.get(&a.id).unwrap().status, AssignmentStatus::NoShow);
    // rejouable sans double comptage
    let again = store.sweep_no_shows(Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap(), 60);
    assert_eq!(again, 0);
}
