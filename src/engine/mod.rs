//! Moteur de détection de conflits de planification.
//!
//! Le moteur est pur : il reçoit un instantané des affectations d'un employé
//! et une fenêtre proposée, et rend un [`ConflictCheckResult`]. Les conflits
//! sont des valeurs, jamais des erreurs ; `Err` est réservé aux entrées
//! malformées.

mod checks;
mod slots;
mod types;
mod util;

pub use slots::AvailableTimeSlot;
pub use types::{
    ConflictCheckResult, ConflictDetail, ConflictSeverity, ConflictType, EngineConfig,
};

use crate::error::PlanResult;
use crate::model::{AssignmentId, Employee, EmployeeId, ShiftAssignment};
use chrono::{NaiveDate, NaiveTime};

/// Vue empruntée sur un employé et ses affectations existantes.
#[derive(Debug, Clone, Copy)]
pub struct EmployeeSnapshot<'a> {
    pub employee: &'a Employee,
    pub assignments: &'a [ShiftAssignment],
}

/// Fenêtre candidate soumise au moteur.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub planned_minutes: i64,
    /// Plafond hebdomadaire étendu applicable (template éligible et employé
    /// volontaire).
    pub overtime_allowed: bool,
    /// Affectation à ignorer pendant la passe (mise à jour, échange).
    pub exclude: Option<AssignmentId>,
}

/// Violation relevée par l'audit global, rattachée à son employé.
#[derive(Debug, Clone)]
pub struct AuditFinding {
    pub employee: EmployeeId,
    pub detail: ConflictDetail,
}

/// Point d'entrée du moteur. Sans état au-delà de sa configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictEngine {
    cfg: EngineConfig,
}

impl ConflictEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Passe complète sur une fenêtre proposée.
    pub fn check(
        &self,
        snap: &EmployeeSnapshot<'_>,
        proposal: &Proposal,
    ) -> PlanResult<ConflictCheckResult> {
        checks::check_all(&self.cfg, snap, proposal)
    }

    /// Valide un échange dans les deux sens, affectations cédées exclues.
    #[allow(clippy::too_many_arguments)]
    pub fn check_swap(
        &self,
        requester: &EmployeeSnapshot<'_>,
        requester_assignment: &ShiftAssignment,
        requester_overtime: bool,
        target: &EmployeeSnapshot<'_>,
        target_assignment: &ShiftAssignment,
        target_overtime: bool,
    ) -> PlanResult<ConflictCheckResult> {
        checks::check_swap(
            &self.cfg,
            requester,
            requester_assignment,
            requester_overtime,
            target,
            target_assignment,
            target_overtime,
        )
    }

    /// Audit a posteriori d'un ensemble d'affectations existantes.
    pub fn audit(
        &self,
        employees: &[Employee],
        assignments: &[ShiftAssignment],
    ) -> Vec<AuditFinding> {
        checks::audit(&self.cfg, employees, assignments)
    }

    /// Créneaux libres d'un employé sur une journée.
    pub fn available_time_slots(
        &self,
        assignments: &[ShiftAssignment],
        date: NaiveDate,
    ) -> Vec<AvailableTimeSlot> {
        slots::find_available_time_slots(&self.cfg, assignments, date)
    }

    /// Créneaux capables d'accueillir `required_minutes`, préférés d'abord.
    pub fn alternative_time_slots(
        &self,
        assignments: &[ShiftAssignment],
        date: NaiveDate,
        required_minutes: i64,
    ) -> Vec<AvailableTimeSlot> {
        slots::suggest_alternative_time_slots(&self.cfg, assignments, date, required_minutes)
    }
}
