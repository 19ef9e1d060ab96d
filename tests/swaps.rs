#![forbid(unsafe_code)]
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use roulement::store::AssignmentStore;
use roulement::swap::{NewSwapRequest, SwapWorkflow};
use roulement::template::NewTemplate;
use roulement::{
    ConflictEngine, Employee, EngineConfig, MemorySink, NewAssignment, NotificationType,
    PlanError, Priority, ShiftAssignment, SwapStatus, TargetResponse, TemplateCatalog,
};
use roulement::model::ManagerResponse;
use std::sync::Arc;

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap()
}

struct Ctx {
    store: Arc<AssignmentStore>,
    swaps: SwapWorkflow,
    sink: Arc<MemorySink>,
    alice: Employee,
    bob: Employee,
    manager: Employee,
}

fn setup() -> Ctx {
    let catalog = Arc::new(TemplateCatalog::new());
    for (code, name, start, end) in [
        ("MAT", "Matin", t(6), t(14)),
        ("SOIR", "Soir", t(14), t(22)),
        ("NUIT", "Nuit", t(22), t(6)),
    ] {
        catalog
            .create(NewTemplate {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                start,
                end,
                break_start: None,
                break_end: None,
                overtime_eligible: false,
                sort_order: 0,
            })
            .unwrap();
    }
    let sink = Arc::new(MemorySink::new());
    let store = Arc::new(AssignmentStore::new(
        catalog,
        ConflictEngine::new(EngineConfig::default()),
        sink.clone(),
    ));
    let alice = Employee::new("alice", "Alice Martin");
    let bob = Employee::new("bob", "Bob Durand");
    let manager = Employee::new("carole", "Carole Petit");
    store.add_employee(alice.clone()).unwrap();
    store.add_employee(bob.clone()).unwrap();
    store.add_employee(manager.clone()).unwrap();
    let swaps = SwapWorkflow::new(store.clone(), sink.clone());
    Ctx {
        store,
        swaps,
        sink,
        alice,
        bob,
        manager,
    }
}

fn assign(ctx: &Ctx, employee: &Employee, template: &str, day: u32) -> ShiftAssignment {
    ctx.store
        .create(
            NewAssignment {
                employee: employee.id.clone(),
                date: d(day),
                template: Some(template.to_string()),
                start: None,
                end: None,
                schedule: None,
                notes: None,
            },
            now(),
        )
        .unwrap()
}

fn request(ctx: &Ctx, offered: &ShiftAssignment, wanted: Option<&ShiftAssignment>) -> roulement::ShiftSwapRequest {
    ctx.swaps
        .create(
            NewSwapRequest {
                requester: ctx.alice.id.clone(),
                requester_assignment: offered.id.clone(),
                target_employee: ctx.bob.id.clone(),
                target_assignment: wanted.map(|a| a.id.clone()),
                priority: Priority::Medium,
                emergency: false,
                reason: Some("family event".to_string()),
                expires_at: Utc.with_ymd_and_hms(2026, 2, 25, 12, 0, 0).unwrap(),
            },
            now(),
        )
        .unwrap()
}

#[test]
fn full_workflow_executes_and_swaps_owners() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    ctx.sink.take();

    let req = request(&ctx, &offered, Some(&wanted));
    assert_eq!(req.status, SwapStatus::Pending);

    let accepted = ctx
        .swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, now())
        .unwrap();
    assert_eq!(accepted.status, SwapStatus::TargetAccepted);

    let executed = ctx
        .swaps
        .approve_by_manager(
            &req.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            now(),
        )
        .unwrap();
    assert_eq!(executed.status, SwapStatus::Executed);
    assert_eq!(executed.approved_by, Some(ctx.manager.id.clone()));

    // les propriétaires ont bien tourné
    assert_eq!(ctx.store.get(&offered.id).unwrap().employee, ctx.bob.id);
    assert_eq!(ctx.store.get(&wanted.id).unwrap().employee, ctx.alice.id);

    let events = ctx.sink.take();
    assert_eq!(
        events
            .iter()
            .filter(|e| e.kind == NotificationType::SwapExecuted)
            .count(),
        2
    );
}

#[test]
fn target_rejection_is_terminal() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));

    let rejected = ctx
        .swaps
        .respond_by_target(
            &req.id,
            &ctx.bob.id,
            TargetResponse::Rejected,
            Some("not available".to_string()),
            None,
            now(),
        )
        .unwrap();
    assert_eq!(rejected.status, SwapStatus::TargetRejected);

    let err = ctx
        .swaps
        .approve_by_manager(
            &req.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidTransition(_)));
}

#[test]
fn infeasible_acceptance_auto_rejects_with_summary() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    // alice enchaîne déjà une nuit le 3 : recevoir le soir de bob ce
    // jour-là laisserait zéro repos.
    assign(&ctx, &ctx.alice, "NUIT", 3);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));

    let updated = ctx
        .swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, now())
        .unwrap();
    assert_eq!(updated.status, SwapStatus::TargetRejected);
    assert!(updated.target_reason.unwrap().contains("conflict"));
}

#[test]
fn execution_aborts_when_the_world_changed_after_approval() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));
    ctx.swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, now())
        .unwrap();

    // entre l'acceptation et l'approbation, alice prend un créneau qui
    // chevauche la vacation qu'elle doit recevoir
    ctx.store
        .create(
            NewAssignment {
                employee: ctx.alice.id.clone(),
                date: d(3),
                template: None,
                start: Some(t(13)),
                end: Some(t(21)),
                schedule: None,
                notes: None,
            },
            now(),
        )
        .unwrap();

    let err = ctx
        .swaps
        .approve_by_manager(
            &req.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::ExecutionAborted(_)));

    // rien n'a bougé, la demande reste approuvée et rejouable
    assert_eq!(ctx.store.get(&offered.id).unwrap().employee, ctx.alice.id);
    assert_eq!(ctx.store.get(&wanted.id).unwrap().employee, ctx.bob.id);
    assert_eq!(
        ctx.swaps.get(&req.id).unwrap().status,
        SwapStatus::ManagerApproved
    );
}

#[test]
fn approved_request_with_aborted_execution_expires_under_the_sweep() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));
    ctx.swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, now())
        .unwrap();

    // alice prend un créneau bloquant : l'exécution avortera
    ctx.store
        .create(
            NewAssignment {
                employee: ctx.alice.id.clone(),
                date: d(3),
                template: None,
                start: Some(t(13)),
                end: Some(t(21)),
                schedule: None,
                notes: None,
            },
            now(),
        )
        .unwrap();
    let err = ctx
        .swaps
        .approve_by_manager(
            &req.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::ExecutionAborted(_)));
    assert_eq!(
        ctx.swaps.get(&req.id).unwrap().status,
        SwapStatus::ManagerApproved
    );

    // passé l'échéance, la demande approuvée expire comme les autres
    let late = Utc.with_ymd_and_hms(2026, 2, 26, 12, 0, 0).unwrap();
    assert_eq!(ctx.swaps.mark_expired_requests(late), 1);
    assert_eq!(ctx.swaps.get(&req.id).unwrap().status, SwapStatus::Expired);

    // un rejeu tardif de l'approbation est refusé, l'état ne bouge plus
    let err = ctx
        .swaps
        .approve_by_manager(
            &req.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            late,
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidTransition(_)));
    assert_eq!(ctx.swaps.get(&req.id).unwrap().status, SwapStatus::Expired);
    // les vacations n'ont jamais changé de mains
    assert_eq!(ctx.store.get(&offered.id).unwrap().employee, ctx.alice.id);
    assert_eq!(ctx.store.get(&wanted.id).unwrap().employee, ctx.bob.id);
}

#[test]
fn executed_swap_can_be_reversed_restoring_owners() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));
    ctx.swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, now())
        .unwrap();
    ctx.swaps
        .approve_by_manager(
            &req.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            now(),
        )
        .unwrap();
    assert_eq!(ctx.store.get(&offered.id).unwrap().employee, ctx.bob.id);

    // échange inverse : bob rend la vacation du matin contre celle du soir
    let back = ctx
        .swaps
        .create(
            NewSwapRequest {
                requester: ctx.bob.id.clone(),
                requester_assignment: offered.id.clone(),
                target_employee: ctx.alice.id.clone(),
                target_assignment: Some(wanted.id.clone()),
                priority: Priority::Medium,
                emergency: false,
                reason: None,
                expires_at: Utc.with_ymd_and_hms(2026, 2, 25, 12, 0, 0).unwrap(),
            },
            now(),
        )
        .unwrap();
    ctx.swaps
        .respond_by_target(&back.id, &ctx.alice.id, TargetResponse::Accepted, None, None, now())
        .unwrap();
    let executed = ctx
        .swaps
        .approve_by_manager(
            &back.id,
            &ctx.manager.id,
            ManagerResponse::Approved,
            None,
            now(),
        )
        .unwrap();
    assert_eq!(executed.status, SwapStatus::Executed);

    // retour à l'état initial, sans aucun conflit résiduel
    assert_eq!(ctx.store.get(&offered.id).unwrap().employee, ctx.alice.id);
    assert_eq!(ctx.store.get(&wanted.id).unwrap().employee, ctx.bob.id);
    let findings = ctx
        .store
        .engine()
        .audit(&ctx.store.employees(), &ctx.store.snapshot());
    assert!(findings.is_empty());
}

#[test]
fn open_request_requires_naming_an_assignment_on_accept() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let counterpart = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, None);

    let err = ctx
        .swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, now())
        .unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));

    let accepted = ctx
        .swaps
        .respond_by_target(
            &req.id,
            &ctx.bob.id,
            TargetResponse::Accepted,
            None,
            Some(counterpart.id.clone()),
            now(),
        )
        .unwrap();
    assert_eq!(accepted.status, SwapStatus::TargetAccepted);
    assert_eq!(accepted.target_assignment, Some(counterpart.id));
}

#[test]
fn expired_request_refuses_late_responses() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));

    let late = Utc.with_ymd_and_hms(2026, 2, 26, 12, 0, 0).unwrap();
    let expired = ctx.swaps.mark_expired_requests(late);
    assert_eq!(expired, 1);
    // rejouable sans effet
    assert_eq!(ctx.swaps.mark_expired_requests(late), 0);

    let err = ctx
        .swaps
        .respond_by_target(&req.id, &ctx.bob.id, TargetResponse::Accepted, None, None, late)
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidTransition(_)));
    assert_eq!(ctx.swaps.get(&req.id).unwrap().status, SwapStatus::Expired);
}

#[test]
fn live_request_blocks_a_second_one_on_the_same_assignment() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    request(&ctx, &offered, Some(&wanted));
    let err = ctx
        .swaps
        .create(
            NewSwapRequest {
                requester: ctx.alice.id.clone(),
                requester_assignment: offered.id.clone(),
                target_employee: ctx.bob.id.clone(),
                target_assignment: None,
                priority: Priority::Low,
                emergency: false,
                reason: None,
                expires_at: Utc.with_ymd_and_hms(2026, 2, 25, 12, 0, 0).unwrap(),
            },
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
}

#[test]
fn requester_can_cancel_before_manager_decision() {
    let ctx = setup();
    let offered = assign(&ctx, &ctx.alice, "MAT", 2);
    let wanted = assign(&ctx, &ctx.bob, "SOIR", 3);
    let req = request(&ctx, &offered, Some(&wanted));

    let err = ctx.swaps.cancel(&req.id, &ctx.bob.id, now()).unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));

    let cancelled = ctx.swaps.cancel(&req.id, &ctx.alice.id, now()).unwrap();
    assert_eq!(cancelled.status, SwapStatus::Cancelled);
}
