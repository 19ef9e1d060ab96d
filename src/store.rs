use crate::engine::{ConflictEngine, EmployeeSnapshot, Proposal};
use crate::error::{PlanError, PlanResult};
use crate::model::{
    window_minutes, AssignmentId, AssignmentStatus, Employee, EmployeeId, ScheduleId,
    ShiftAssignment,
};
use crate::notification::{NotificationEvent, NotificationSink, NotificationType};
use crate::template::TemplateCatalog;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

/// Paramètres de création d'une affectation. Soit un code de template, soit
/// une fenêtre explicite `start`/`end`.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub employee: EmployeeId,
    pub date: NaiveDate,
    pub template: Option<String>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub schedule: Option<ScheduleId>,
    pub notes: Option<String>,
}

/// Résultat d'une passe d'affectation automatique.
#[derive(Debug, Clone, Default)]
pub struct AutoAssignReport {
    pub created: Vec<AssignmentId>,
    /// (date, employé, résumé du conflit) pour chaque créneau laissé vacant.
    pub skipped: Vec<(NaiveDate, EmployeeId, String)>,
}

/// Dépôt canonique des affectations et des employés.
///
/// Toute mutation passe par le verrou d'employé : deux écritures concernant
/// le même employé se sérialisent, la validation et le commit restent donc
/// atomiques vis-à-vis de ses autres affectations. Les lectures ne prennent
/// que le `RwLock` interne.
pub struct AssignmentStore {
    assignments: RwLock<Vec<ShiftAssignment>>,
    employees: RwLock<Vec<Employee>>,
    catalog: Arc<TemplateCatalog>,
    engine: ConflictEngine,
    sink: Arc<dyn NotificationSink>,
    guards: Mutex<HashMap<EmployeeId, Arc<Mutex<()>>>>,
}

impl AssignmentStore {
    pub fn new(
        catalog: Arc<TemplateCatalog>,
        engine: ConflictEngine,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            assignments: RwLock::new(Vec::new()),
            employees: RwLock::new(Vec::new()),
            catalog,
            engine,
            sink,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// Reconstruit un dépôt depuis un état persisté.
    pub fn from_parts(
        employees: Vec<Employee>,
        assignments: Vec<ShiftAssignment>,
        catalog: Arc<TemplateCatalog>,
        engine: ConflictEngine,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            assignments: RwLock::new(assignments),
            employees: RwLock::new(employees),
            catalog,
            engine,
            sink,
            guards: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &ConflictEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    // ---- employés ----

    pub fn add_employee(&self, employee: Employee) -> PlanResult<()> {
        let mut employees = self.employees.write().expect("store lock poisoned");
        if employees.iter().any(|e| e.handle == employee.handle) {
            return Err(PlanError::Validation(format!(
                "employee handle {} already exists",
                employee.handle
            )));
        }
        employees.push(employee);
        Ok(())
    }

    pub fn employee(&self, id: &EmployeeId) -> PlanResult<Employee> {
        self.employees
            .read()
            .expect("store lock poisoned")
            .iter()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("employee {}", id.as_str())))
    }

    pub fn employee_by_handle(&self, handle: &str) -> PlanResult<Employee> {
        self.employees
            .read()
            .expect("store lock poisoned")
            .iter()
            .find(|e| e.handle == handle)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("employee handle {handle}")))
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.employees.read().expect("store lock poisoned").clone()
    }

    // ---- cycle de vie d'une affectation ----

    /// Crée une affectation après une passe de détection complète.
    /// Le moindre conflit fait échouer la création avec le résultat entier.
    pub fn create(&self, spec: NewAssignment, now: DateTime<Utc>) -> PlanResult<ShiftAssignment> {
        let guard = self.guard(&spec.employee);
        let _held = guard.lock().expect("employee guard poisoned");

        let employee = self.employee(&spec.employee)?;

        let (start, end, template_code, break_minutes, overtime_allowed) = match &spec.template {
            Some(code) => {
                let template = self
                    .catalog
                    .get(code)
                    .ok_or_else(|| PlanError::NotFound(format!("template {code}")))?;
                if !template.active {
                    return Err(PlanError::Validation(format!(
                        "template {code} is deactivated"
                    )));
                }
                (
                    template.start,
                    template.end,
                    Some(template.code.clone()),
                    template.break_minutes(),
                    template.overtime_eligible && employee.overtime_opt_in,
                )
            }
            None => {
                let (start, end) = match (spec.start, spec.end) {
                    (Some(s), Some(e)) => (s, e),
                    _ => {
                        return Err(PlanError::Validation(
                            "a manual assignment requires both start and end".to_string(),
                        ));
                    }
                };
                (start, end, None, 0, false)
            }
        };

        let planned_minutes = window_minutes(start, end);
        let result = {
            let assignments = self.assignments.read().expect("store lock poisoned");
            let own: Vec<ShiftAssignment> = assignments
                .iter()
                .filter(|a| a.employee == employee.id)
                .cloned()
                .collect();
            self.engine.check(
                &EmployeeSnapshot {
                    employee: &employee,
                    assignments: &own,
                },
                &Proposal {
                    date: spec.date,
                    start,
                    end,
                    planned_minutes,
                    overtime_allowed,
                    exclude: None,
                },
            )?
        };
        if result.has_conflict() {
            return Err(PlanError::Conflict(result));
        }

        let mut assignment = ShiftAssignment::new(employee.id.clone(), spec.date, start, end)?;
        assignment.template_code = template_code.clone();
        assignment.break_minutes = break_minutes;
        assignment.schedule = spec.schedule;
        assignment.notes = spec.notes;

        self.assignments
            .write()
            .expect("store lock poisoned")
            .push(assignment.clone());
        if let Some(code) = &template_code {
            self.catalog.mark_referenced(code);
        }
        debug!(id = %assignment.id.as_str(), employee = %employee.handle, "assignment created");
        self.emit(
            NotificationType::AssignmentCreated,
            &employee.id,
            now,
            format!("shift on {}", assignment.date),
            format!(
                "you are scheduled on {} from {} to {}",
                assignment.date, assignment.start, assignment.end
            ),
        );
        Ok(assignment)
    }

    /// Déplace la fenêtre d'une affectation encore `Scheduled`, en la
    /// revalidant contre les autres affectations de l'employé (elle-même
    /// exclue).
    pub fn update_window(
        &self,
        id: &AssignmentId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> PlanResult<ShiftAssignment> {
        let current = self.get(id)?;
        let guard = self.guard(&current.employee);
        let _held = guard.lock().expect("employee guard poisoned");

        let current = self.get(id)?;
        if current.status != AssignmentStatus::Scheduled {
            return Err(PlanError::InvalidTransition(
                "only a Scheduled assignment can be rescheduled",
            ));
        }
        let employee = self.employee(&current.employee)?;
        let overtime_allowed = current
            .template_code
            .as_deref()
            .and_then(|code| self.catalog.get(code))
            .map(|t| t.overtime_eligible && employee.overtime_opt_in)
            .unwrap_or(false);
        let planned_minutes = window_minutes(start, end);
        let result = {
            let assignments = self.assignments.read().expect("store lock poisoned");
            let own: Vec<ShiftAssignment> = assignments
                .iter()
                .filter(|a| a.employee == employee.id)
                .cloned()
                .collect();
            self.engine.check(
                &EmployeeSnapshot {
                    employee: &employee,
                    assignments: &own,
                },
                &Proposal {
                    date,
                    start,
                    end,
                    planned_minutes,
                    overtime_allowed,
                    exclude: Some(id.clone()),
                },
            )?
        };
        if result.has_conflict() {
            return Err(PlanError::Conflict(result));
        }

        let mut assignments = self.assignments.write().expect("store lock poisoned");
        let assignment = assignments
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| PlanError::NotFound(format!("assignment {}", id.as_str())))?;
        assignment.date = date;
        assignment.start = start;
        assignment.end = end;
        assignment.planned_minutes = planned_minutes;
        Ok(assignment.clone())
    }

    /// Annulation douce : l'affectation reste dans l'historique.
    pub fn cancel(
        &self,
        id: &AssignmentId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> PlanResult<ShiftAssignment> {
        let current = self.get(id)?;
        let guard = self.guard(&current.employee);
        let _held = guard.lock().expect("employee guard poisoned");

        let cancelled = {
            let mut assignments = self.assignments.write().expect("store lock poisoned");
            let assignment = assignments
                .iter_mut()
                .find(|a| &a.id == id)
                .ok_or_else(|| PlanError::NotFound(format!("assignment {}", id.as_str())))?;
            assignment.cancel(reason)?;
            assignment.clone()
        };
        self.emit(
            NotificationType::AssignmentCancelled,
            &cancelled.employee,
            now,
            format!("shift on {} cancelled", cancelled.date),
            format!("your shift on {} was cancelled: {reason}", cancelled.date),
        );
        Ok(cancelled)
    }

    pub fn check_in(&self, id: &AssignmentId, now: DateTime<Utc>) -> PlanResult<ShiftAssignment> {
        let tolerance = self.engine.config().attendance_tolerance_minutes;
        let updated = {
            let mut assignments = self.assignments.write().expect("store lock poisoned");
            let assignment = assignments
                .iter_mut()
                .find(|a| &a.id == id)
                .ok_or_else(|| PlanError::NotFound(format!("assignment {}", id.as_str())))?;
            assignment.check_in(now, tolerance)?;
            assignment.clone()
        };
        self.emit(
            NotificationType::CheckedIn,
            &updated.employee,
            now,
            format!("checked in on {}", updated.date),
            format!("check-in recorded at {}", now.to_rfc3339()),
        );
        Ok(updated)
    }

    pub fn check_out(&self, id: &AssignmentId, now: DateTime<Utc>) -> PlanResult<ShiftAssignment> {
        let tolerance = self.engine.config().attendance_tolerance_minutes;
        let updated = {
            let mut assignments = self.assignments.write().expect("store lock poisoned");
            let assignment = assignments
                .iter_mut()
                .find(|a| &a.id == id)
                .ok_or_else(|| PlanError::NotFound(format!("assignment {}", id.as_str())))?;
            assignment.check_out(now, tolerance)?;
            assignment.clone()
        };
        self.emit(
            NotificationType::CheckedOut,
            &updated.employee,
            now,
            format!("checked out on {}", updated.date),
            format!("check-out recorded at {}", now.to_rfc3339()),
        );
        Ok(updated)
    }

    pub fn mark_no_show(&self, id: &AssignmentId) -> PlanResult<ShiftAssignment> {
        let mut assignments = self.assignments.write().expect("store lock poisoned");
        let assignment = assignments
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| PlanError::NotFound(format!("assignment {}", id.as_str())))?;
        assignment.mark_no_show()?;
        Ok(assignment.clone())
    }

    // ---- requêtes ----

    pub fn get(&self, id: &AssignmentId) -> PlanResult<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("assignment {}", id.as_str())))
    }

    pub fn by_employee(&self, employee: &EmployeeId) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| &a.employee == employee)
            .cloned()
            .collect()
    }

    pub fn by_date(&self, date: NaiveDate) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| a.date == date)
            .cloned()
            .collect()
    }

    pub fn by_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| a.date >= from && a.date <= to)
            .cloned()
            .collect()
    }

    pub fn by_schedule(&self, schedule: &ScheduleId) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| a.schedule.as_ref() == Some(schedule))
            .cloned()
            .collect()
    }

    /// Affectations d'un employé sur la semaine (lundi-dimanche) contenant
    /// `date`.
    pub fn week_of(&self, employee: &EmployeeId, date: NaiveDate) -> Vec<ShiftAssignment> {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let sunday = monday + Duration::days(6);
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| &a.employee == employee && a.date >= monday && a.date <= sunday)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .clone()
    }

    /// Affectations `Scheduled` dont le pointage d'arrivée est en retard.
    pub fn pending_check_ins(&self, now: DateTime<Utc>) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| a.status == AssignmentStatus::Scheduled && a.interval().0 <= now)
            .cloned()
            .collect()
    }

    /// Affectations `CheckedIn` dont la fenêtre est terminée.
    pub fn pending_check_outs(&self, now: DateTime<Utc>) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| a.status == AssignmentStatus::CheckedIn && a.interval().1 <= now)
            .cloned()
            .collect()
    }

    /// Affectations futures `Scheduled` d'un employé, éligibles à un échange.
    pub fn swappable(&self, employee: &EmployeeId, now: DateTime<Utc>) -> Vec<ShiftAssignment> {
        self.assignments
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|a| {
                &a.employee == employee
                    && a.status == AssignmentStatus::Scheduled
                    && a.interval().0 > now
            })
            .cloned()
            .collect()
    }

    // ---- opérations en masse ----

    /// Affectation automatique : pour chaque date, remplit `headcount` postes
    /// du template en tournant sur les employés. Un employé en conflit est
    /// sauté, pas bloquant.
    pub fn auto_assign(
        &self,
        template_code: &str,
        dates: &[NaiveDate],
        headcount: usize,
        schedule: Option<ScheduleId>,
        now: DateTime<Utc>,
    ) -> PlanResult<AutoAssignReport> {
        let employees = self.employees();
        if employees.is_empty() {
            return Err(PlanError::Validation(
                "cannot auto-assign without employees".to_string(),
            ));
        }
        let mut report = AutoAssignReport::default();
        let mut cursor = 0usize;
        for &date in dates {
            let mut filled = 0usize;
            let mut tried = 0usize;
            while filled < headcount && tried < employees.len() {
                let employee = &employees[cursor % employees.len()];
                cursor += 1;
                tried += 1;
                match self.create(
                    NewAssignment {
                        employee: employee.id.clone(),
                        date,
                        template: Some(template_code.to_string()),
                        start: None,
                        end: None,
                        schedule: schedule.clone(),
                        notes: None,
                    },
                    now,
                ) {
                    Ok(a) => {
                        report.created.push(a.id);
                        filled += 1;
                    }
                    Err(PlanError::Conflict(result)) => {
                        report
                            .skipped
                            .push((date, employee.id.clone(), result.summary));
                    }
                    Err(other) => return Err(other),
                }
            }
            if filled < headcount {
                warn!(%date, filled, headcount, "auto-assign left open slots");
            }
        }
        Ok(report)
    }

    /// Copie les affectations `Scheduled` d'une période vers une autre,
    /// décalées d'un nombre entier de jours. Tout ou rien : la première
    /// copie en conflit annule l'ensemble.
    pub fn copy_assignments(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        target_start: NaiveDate,
        schedule: Option<ScheduleId>,
        now: DateTime<Utc>,
    ) -> PlanResult<Vec<ShiftAssignment>> {
        let offset = target_start - from;
        let sources: Vec<ShiftAssignment> = self
            .by_range(from, to)
            .into_iter()
            .filter(|a| a.status == AssignmentStatus::Scheduled)
            .collect();

        // Verrous de tous les employés concernés, par identifiant croissant.
        let mut involved: Vec<EmployeeId> = sources.iter().map(|a| a.employee.clone()).collect();
        involved.sort();
        involved.dedup();
        let guards: Vec<Arc<Mutex<()>>> = involved.iter().map(|e| self.guard(e)).collect();
        let _held: Vec<_> = guards
            .iter()
            .map(|g| g.lock().expect("employee guard poisoned"))
            .collect();

        let mut staged: Vec<ShiftAssignment> = Vec::new();
        {
            let assignments = self.assignments.read().expect("store lock poisoned");
            for source in &sources {
                let date = source.date + offset;
                let employee = self.employee(&source.employee)?;
                let overtime_allowed = source
                    .template_code
                    .as_deref()
                    .and_then(|code| self.catalog.get(code))
                    .map(|t| t.overtime_eligible && employee.overtime_opt_in)
                    .unwrap_or(false);
                let mut own: Vec<ShiftAssignment> = assignments
                    .iter()
                    .filter(|a| a.employee == employee.id)
                    .cloned()
                    .collect();
                own.extend(staged.iter().filter(|a| a.employee == employee.id).cloned());
                let mut result = self.engine.check(
                    &EmployeeSnapshot {
                        employee: &employee,
                        assignments: &own,
                    },
                    &Proposal {
                        date,
                        start: source.start,
                        end: source.end,
                        planned_minutes: source.planned_minutes,
                        overtime_allowed,
                        exclude: None,
                    },
                )?;
                if result.has_conflict() {
                    result.summary = format!(
                        "copy aborted at source assignment {}: {}",
                        source.id.as_str(),
                        result.summary
                    );
                    return Err(PlanError::Conflict(result));
                }
                let mut copy =
                    ShiftAssignment::new(employee.id.clone(), date, source.start, source.end)?;
                copy.template_code = source.template_code.clone();
                copy.break_minutes = source.break_minutes;
                copy.schedule = schedule.clone();
                staged.push(copy);
            }
        }

        self.assignments
            .write()
            .expect("store lock poisoned")
            .extend(staged.iter().cloned());
        for copy in &staged {
            self.emit(
                NotificationType::AssignmentCreated,
                &copy.employee,
                now,
                format!("shift on {}", copy.date),
                format!(
                    "you are scheduled on {} from {} to {}",
                    copy.date, copy.start, copy.end
                ),
            );
        }
        Ok(staged)
    }

    /// Échange les propriétaires de deux affectations.
    ///
    /// Les verrous des deux employés sont pris par identifiant croissant,
    /// puis l'état est relu et revalidé sous verrou : si le monde a changé
    /// depuis l'approbation, l'échange avorte sans rien toucher. Une tentative
    /// avortée est rejouée une fois.
    pub fn execute_swap(&self, a_id: &AssignmentId, b_id: &AssignmentId) -> PlanResult<()> {
        match self.try_execute_swap(a_id, b_id) {
            Err(PlanError::ExecutionAborted(reason)) => {
                warn!(%reason, "swap execution aborted, retrying once");
                self.try_execute_swap(a_id, b_id)
            }
            other => other,
        }
    }

    fn try_execute_swap(&self, a_id: &AssignmentId, b_id: &AssignmentId) -> PlanResult<()> {
        let a = self.get(a_id)?;
        let b = self.get(b_id)?;
        if a.employee == b.employee {
            return Err(PlanError::Validation(
                "cannot swap two assignments of the same employee".to_string(),
            ));
        }

        // Ordre global sur les identifiants d'employé : pas d'interblocage.
        let (first, second) = if a.employee <= b.employee {
            (a.employee.clone(), b.employee.clone())
        } else {
            (b.employee.clone(), a.employee.clone())
        };
        let first_guard = self.guard(&first);
        let second_guard = self.guard(&second);
        let _held_first = first_guard.lock().expect("employee guard poisoned");
        let _held_second = second_guard.lock().expect("employee guard poisoned");

        // Relecture sous verrou : l'état peut avoir bougé depuis l'approbation.
        let a = self.get(a_id)?;
        let b = self.get(b_id)?;
        if a.status != AssignmentStatus::Scheduled || b.status != AssignmentStatus::Scheduled {
            return Err(PlanError::ExecutionAborted(
                "an assignment is no longer Scheduled".to_string(),
            ));
        }

        let a_employee = self.employee(&a.employee)?;
        let b_employee = self.employee(&b.employee)?;
        // Chacun reçoit la vacation de l'autre : l'éligibilité aux heures
        // supplémentaires suit le template reçu.
        let a_overtime = self.template_overtime(&b) && a_employee.overtime_opt_in;
        let b_overtime = self.template_overtime(&a) && b_employee.overtime_opt_in;
        let result = {
            let assignments = self.assignments.read().expect("store lock poisoned");
            let a_own: Vec<ShiftAssignment> = assignments
                .iter()
                .filter(|x| x.employee == a_employee.id)
                .cloned()
                .collect();
            let b_own: Vec<ShiftAssignment> = assignments
                .iter()
                .filter(|x| x.employee == b_employee.id)
                .cloned()
                .collect();
            self.engine.check_swap(
                &EmployeeSnapshot {
                    employee: &a_employee,
                    assignments: &a_own,
                },
                &a,
                a_overtime,
                &EmployeeSnapshot {
                    employee: &b_employee,
                    assignments: &b_own,
                },
                &b,
                b_overtime,
            )?
        };
        if result.has_conflict() {
            return Err(PlanError::ExecutionAborted(result.summary));
        }

        let mut assignments = self.assignments.write().expect("store lock poisoned");
        let mut a_idx = None;
        let mut b_idx = None;
        for (i, x) in assignments.iter().enumerate() {
            if &x.id == a_id {
                a_idx = Some(i);
            } else if &x.id == b_id {
                b_idx = Some(i);
            }
        }
        match (a_idx, b_idx) {
            (Some(ai), Some(bi)) => {
                assignments[ai].employee = b_employee.id.clone();
                assignments[bi].employee = a_employee.id.clone();
                debug!(
                    a = %a_id.as_str(),
                    b = %b_id.as_str(),
                    "swap executed"
                );
                Ok(())
            }
            _ => Err(PlanError::ExecutionAborted(
                "an assignment vanished before commit".to_string(),
            )),
        }
    }

    /// Balaye les affectations `Scheduled` passées sans pointage et les
    /// marque `NoShow`. Rend le nombre d'affectations marquées.
    pub fn sweep_no_shows(&self, now: DateTime<Utc>, grace_minutes: i64) -> usize {
        let mut assignments = self.assignments.write().expect("store lock poisoned");
        let mut marked = 0usize;
        for a in assignments.iter_mut() {
            if a.status == AssignmentStatus::Scheduled
                && a.interval().1 + Duration::minutes(grace_minutes) <= now
                && a.mark_no_show().is_ok()
            {
                marked += 1;
            }
        }
        marked
    }

    fn template_overtime(&self, assignment: &ShiftAssignment) -> bool {
        assignment
            .template_code
            .as_deref()
            .and_then(|code| self.catalog.get(code))
            .map(|t| t.overtime_eligible)
            .unwrap_or(false)
    }

    fn guard(&self, employee: &EmployeeId) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().expect("guard table poisoned");
        guards
            .entry(employee.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn emit(
        &self,
        kind: NotificationType,
        recipient: &EmployeeId,
        at: DateTime<Utc>,
        subject: String,
        message: String,
    ) {
        self.sink.publish(NotificationEvent {
            kind,
            recipient: recipient.clone(),
            at,
            subject,
            message,
        });
    }
}
