use crate::engine::EmployeeSnapshot;
use crate::error::{PlanError, PlanResult};
use crate::model::{
    AssignmentId, AssignmentStatus, EmployeeId, ManagerResponse, Priority, ShiftSwapRequest,
    SwapId, SwapStatus, TargetResponse,
};
use crate::notification::{NotificationEvent, NotificationSink, NotificationType};
use crate::store::AssignmentStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Paramètres de création d'une demande d'échange. `target_assignment` à
/// `None` crée une demande ouverte : la cible désignera sa vacation en
/// acceptant.
#[derive(Debug, Clone)]
pub struct NewSwapRequest {
    pub requester: EmployeeId,
    pub requester_assignment: AssignmentId,
    pub target_employee: EmployeeId,
    pub target_assignment: Option<AssignmentId>,
    pub priority: Priority,
    pub emergency: bool,
    pub reason: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Négociation d'échanges de vacations.
///
/// Le workflow possède les demandes mais jamais les affectations : la seule
/// mutation d'affectations passe par [`AssignmentStore::execute_swap`], au
/// moment de l'approbation. Une demande en cours n'empêche donc aucune autre
/// opération sur les vacations qu'elle référence ; c'est l'exécution qui
/// revalide.
pub struct SwapWorkflow {
    requests: RwLock<Vec<ShiftSwapRequest>>,
    store: Arc<AssignmentStore>,
    sink: Arc<dyn NotificationSink>,
}

impl SwapWorkflow {
    pub fn new(store: Arc<AssignmentStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            requests: RwLock::new(Vec::new()),
            store,
            sink,
        }
    }

    pub fn from_parts(
        requests: Vec<ShiftSwapRequest>,
        store: Arc<AssignmentStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            requests: RwLock::new(requests),
            store,
            sink,
        }
    }

    /// Crée une demande après vérification de la propriété des vacations et
    /// de l'absence d'autre demande vivante sur les mêmes affectations.
    pub fn create(&self, spec: NewSwapRequest, now: DateTime<Utc>) -> PlanResult<ShiftSwapRequest> {
        let offered = self.store.get(&spec.requester_assignment)?;
        if offered.employee != spec.requester {
            return Err(PlanError::Validation(
                "requester does not own the offered assignment".to_string(),
            ));
        }
        if offered.status != AssignmentStatus::Scheduled {
            return Err(PlanError::Validation(
                "only a Scheduled assignment can be offered for swap".to_string(),
            ));
        }
        if let Some(target_id) = &spec.target_assignment {
            let wanted = self.store.get(target_id)?;
            if wanted.employee != spec.target_employee {
                return Err(PlanError::Validation(
                    "target does not own the requested assignment".to_string(),
                ));
            }
            if wanted.status != AssignmentStatus::Scheduled {
                return Err(PlanError::Validation(
                    "only a Scheduled assignment can be requested".to_string(),
                ));
            }
        }

        let mut requests = self.requests.write().expect("swap lock poisoned");
        let busy = requests.iter().any(|r| {
            r.is_live()
                && (r.requester_assignment == spec.requester_assignment
                    || r.target_assignment.as_ref() == Some(&spec.requester_assignment)
                    || spec
                        .target_assignment
                        .as_ref()
                        .is_some_and(|t| &r.requester_assignment == t
                            || r.target_assignment.as_ref() == Some(t)))
        });
        if busy {
            return Err(PlanError::Validation(
                "an assignment is already referenced by a live swap request".to_string(),
            ));
        }

        let mut request = ShiftSwapRequest::new(
            spec.requester.clone(),
            spec.requester_assignment,
            spec.target_employee.clone(),
            spec.target_assignment,
            spec.priority,
            spec.expires_at,
            now,
        )?;
        request.emergency = spec.emergency;
        request.request_reason = spec.reason;
        requests.push(request.clone());
        debug!(id = %request.id.as_str(), "swap request created");
        self.emit(
            NotificationType::SwapRequestCreated,
            &spec.target_employee,
            now,
            "swap request received".to_string(),
            format!(
                "{} proposes to swap a shift with you",
                spec.requester.as_str()
            ),
        );
        Ok(request)
    }

    /// Réponse de l'employé cible.
    ///
    /// Sur une demande ouverte, l'acceptation doit désigner la vacation
    /// offerte en retour (`open_assignment`). Une acceptation dont la
    /// faisabilité est déjà invalide bascule la demande en `TargetRejected`
    /// avec le résumé des conflits : la réponse reste un succès, le refus est
    /// porté par l'état.
    pub fn respond_by_target(
        &self,
        id: &SwapId,
        responder: &EmployeeId,
        response: TargetResponse,
        reason: Option<String>,
        open_assignment: Option<AssignmentId>,
        now: DateTime<Utc>,
    ) -> PlanResult<ShiftSwapRequest> {
        let current = self.get(id)?;
        if &current.target_employee != responder {
            return Err(PlanError::Validation(
                "only the target employee can respond".to_string(),
            ));
        }
        if now >= current.expires_at && current.is_live() {
            self.apply(id, |r| r.expire(now))?;
            self.emit(
                NotificationType::SwapExpired,
                &current.requester,
                now,
                "swap request expired".to_string(),
                "your swap request expired before the target responded".to_string(),
            );
            return Err(PlanError::InvalidTransition("swap request has expired"));
        }

        match response {
            TargetResponse::Rejected => {
                let updated = self.apply(id, |r| r.respond_by_target(response, reason, now))?;
                self.emit(
                    NotificationType::SwapTargetRejected,
                    &updated.requester,
                    now,
                    "swap request declined".to_string(),
                    updated
                        .target_reason
                        .clone()
                        .unwrap_or_else(|| "the target declined".to_string()),
                );
                Ok(updated)
            }
            TargetResponse::Accepted => {
                let target_assignment = match current.target_assignment.clone().or(open_assignment)
                {
                    Some(a) => a,
                    None => {
                        return Err(PlanError::Validation(
                            "accepting an open request requires naming an assignment".to_string(),
                        ));
                    }
                };
                let wanted = self.store.get(&target_assignment)?;
                if wanted.employee != current.target_employee {
                    return Err(PlanError::Validation(
                        "target does not own the named assignment".to_string(),
                    ));
                }
                if wanted.status != AssignmentStatus::Scheduled {
                    return Err(PlanError::Validation(
                        "the named assignment is no longer Scheduled".to_string(),
                    ));
                }

                let check = self.feasibility(&current.requester_assignment, &target_assignment)?;
                if check.has_conflict() {
                    // Refus automatique : la demande meurt avec l'explication.
                    let summary = check.summary.clone();
                    let updated = self.apply(id, |r| {
                        r.respond_by_target(
                            TargetResponse::Rejected,
                            Some(summary.clone()),
                            now,
                        )
                    })?;
                    self.emit(
                        NotificationType::SwapTargetRejected,
                        &updated.requester,
                        now,
                        "swap request infeasible".to_string(),
                        check.summary,
                    );
                    return Ok(updated);
                }

                let updated = self.apply(id, |r| {
                    r.target_assignment = Some(target_assignment.clone());
                    r.respond_by_target(response, reason, now)
                })?;
                self.emit(
                    NotificationType::SwapTargetAccepted,
                    &updated.requester,
                    now,
                    "swap request accepted".to_string(),
                    "the target accepted, awaiting manager approval".to_string(),
                );
                Ok(updated)
            }
        }
    }

    /// Décision du manager. L'approbation déclenche l'exécution : si elle
    /// avorte, la demande reste `ManagerApproved` et l'erreur remonte ;
    /// rejouer l'approbation est sans effet de bord supplémentaire. Passé
    /// `expires_at`, une demande restée `ManagerApproved` expire comme toute
    /// demande vivante.
    pub fn approve_by_manager(
        &self,
        id: &SwapId,
        manager: &EmployeeId,
        response: ManagerResponse,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> PlanResult<ShiftSwapRequest> {
        let current = self.get(id)?;
        if now >= current.expires_at && current.is_live() {
            self.apply(id, |r| r.expire(now))?;
            self.emit(
                NotificationType::SwapExpired,
                &current.requester,
                now,
                "swap request expired".to_string(),
                "your swap request expired before the manager decided".to_string(),
            );
            return Err(PlanError::InvalidTransition("swap request has expired"));
        }

        if response == ManagerResponse::Rejected {
            let updated = self.apply(id, |r| {
                r.respond_by_manager(manager.clone(), response, reason, now)
            })?;
            for recipient in [&updated.requester, &updated.target_employee] {
                self.emit(
                    NotificationType::SwapRejected,
                    recipient,
                    now,
                    "swap request rejected".to_string(),
                    updated
                        .manager_reason
                        .clone()
                        .unwrap_or_else(|| "rejected by manager".to_string()),
                );
            }
            return Ok(updated);
        }

        let approved = if current.status == SwapStatus::ManagerApproved {
            // Rejeu après une exécution avortée : on retente le commit.
            current
        } else {
            let approved = self.apply(id, |r| {
                r.respond_by_manager(manager.clone(), response, reason, now)
            })?;
            for recipient in [&approved.requester, &approved.target_employee] {
                self.emit(
                    NotificationType::SwapApproved,
                    recipient,
                    now,
                    "swap request approved".to_string(),
                    "the manager approved the swap, execution in progress".to_string(),
                );
            }
            approved
        };
        let target_assignment =
            approved
                .target_assignment
                .clone()
                .ok_or(PlanError::InvalidTransition(
                    "an approved request must name both assignments",
                ))?;

        self.store
            .execute_swap(&approved.requester_assignment, &target_assignment)?;

        let updated = self.apply(id, |r| r.mark_executed(now))?;
        info!(id = %updated.id.as_str(), "swap executed");
        for recipient in [&updated.requester, &updated.target_employee] {
            self.emit(
                NotificationType::SwapExecuted,
                recipient,
                now,
                "swap executed".to_string(),
                "the shift swap was approved and executed".to_string(),
            );
        }
        Ok(updated)
    }

    /// Annulation par le demandeur, avant décision du manager.
    pub fn cancel(
        &self,
        id: &SwapId,
        by: &EmployeeId,
        now: DateTime<Utc>,
    ) -> PlanResult<ShiftSwapRequest> {
        let current = self.get(id)?;
        if &current.requester != by {
            return Err(PlanError::Validation(
                "only the requester can cancel a swap request".to_string(),
            ));
        }
        let updated = self.apply(id, |r| r.cancel(now))?;
        self.emit(
            NotificationType::SwapCancelled,
            &updated.target_employee,
            now,
            "swap request cancelled".to_string(),
            "the requester withdrew the swap request".to_string(),
        );
        Ok(updated)
    }

    /// Balayage périodique : expire toute demande vivante dont l'échéance est
    /// passée. Rejouable, rend le nombre de demandes expirées.
    pub fn mark_expired_requests(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<ShiftSwapRequest> = {
            let mut requests = self.requests.write().expect("swap lock poisoned");
            requests
                .iter_mut()
                .filter(|r| r.is_live() && now >= r.expires_at)
                .filter_map(|r| r.expire(now).ok().map(|_| r.clone()))
                .collect()
        };
        for request in &expired {
            self.emit(
                NotificationType::SwapExpired,
                &request.requester,
                now,
                "swap request expired".to_string(),
                "your swap request expired without a decision".to_string(),
            );
        }
        expired.len()
    }

    /// Prévient les demandeurs dont la demande expire dans `within_hours`.
    pub fn notify_expiring(&self, now: DateTime<Utc>, within_hours: i64) -> usize {
        let horizon = now + Duration::hours(within_hours);
        let soon: Vec<ShiftSwapRequest> = self
            .requests
            .read()
            .expect("swap lock poisoned")
            .iter()
            .filter(|r| r.is_live() && r.expires_at > now && r.expires_at <= horizon)
            .cloned()
            .collect();
        for request in &soon {
            self.emit(
                NotificationType::SwapExpiring,
                &request.requester,
                now,
                "swap request expiring soon".to_string(),
                format!("your swap request expires at {}", request.expires_at),
            );
        }
        soon.len()
    }

    // ---- requêtes ----

    pub fn get(&self, id: &SwapId) -> PlanResult<ShiftSwapRequest> {
        self.requests
            .read()
            .expect("swap lock poisoned")
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("swap request {}", id.as_str())))
    }

    pub fn by_requester(&self, employee: &EmployeeId) -> Vec<ShiftSwapRequest> {
        self.filtered(|r| &r.requester == employee)
    }

    pub fn by_target(&self, employee: &EmployeeId) -> Vec<ShiftSwapRequest> {
        self.filtered(|r| &r.target_employee == employee)
    }

    pub fn pending_for_target(&self, employee: &EmployeeId) -> Vec<ShiftSwapRequest> {
        self.filtered(|r| &r.target_employee == employee && r.status == SwapStatus::Pending)
    }

    pub fn pending_manager_approval(&self) -> Vec<ShiftSwapRequest> {
        self.filtered(|r| r.status == SwapStatus::TargetAccepted)
    }

    pub fn emergency_requests(&self) -> Vec<ShiftSwapRequest> {
        self.filtered(|r| r.emergency && r.is_live())
    }

    pub fn snapshot(&self) -> Vec<ShiftSwapRequest> {
        self.requests.read().expect("swap lock poisoned").clone()
    }

    fn filtered<F: Fn(&ShiftSwapRequest) -> bool>(&self, pred: F) -> Vec<ShiftSwapRequest> {
        self.requests
            .read()
            .expect("swap lock poisoned")
            .iter()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    /// Faisabilité d'un échange, sans rien muter : passe croisée du moteur
    /// sur les deux employés.
    fn feasibility(
        &self,
        requester_assignment: &AssignmentId,
        target_assignment: &AssignmentId,
    ) -> PlanResult<crate::engine::ConflictCheckResult> {
        let offered = self.store.get(requester_assignment)?;
        let wanted = self.store.get(target_assignment)?;
        let requester = self.store.employee(&offered.employee)?;
        let target = self.store.employee(&wanted.employee)?;
        let requester_own = self.store.by_employee(&requester.id);
        let target_own = self.store.by_employee(&target.id);
        // Chacun recevrait la vacation de l'autre : l'éligibilité aux heures
        // supplémentaires suit le template reçu, comme à l'exécution.
        let template_overtime = |a: &crate::model::ShiftAssignment| {
            a.template_code
                .as_deref()
                .and_then(|code| self.store.catalog().get(code))
                .map(|t| t.overtime_eligible)
                .unwrap_or(false)
        };
        self.store.engine().check_swap(
            &EmployeeSnapshot {
                employee: &requester,
                assignments: &requester_own,
            },
            &offered,
            template_overtime(&wanted) && requester.overtime_opt_in,
            &EmployeeSnapshot {
                employee: &target,
                assignments: &target_own,
            },
            &wanted,
            template_overtime(&offered) && target.overtime_opt_in,
        )
    }

    fn apply<F>(&self, id: &SwapId, f: F) -> PlanResult<ShiftSwapRequest>
    where
        F: FnOnce(&mut ShiftSwapRequest) -> Result<(), PlanError>,
    {
        let mut requests = self.requests.write().expect("swap lock poisoned");
        let request = requests
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| PlanError::NotFound(format!("swap request {}", id.as_str())))?;
        f(request)?;
        Ok(request.clone())
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
