use crate::model::AssignmentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Paramètres de détection de conflits. Valeurs par organisation, pas des
/// constantes globales ; tout est en minutes pour éviter les flottants.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Repos minimal entre deux vacations d'un même employé.
    pub min_rest_minutes: i64,
    /// Plafond hebdomadaire standard (semaine ancrée au lundi).
    pub max_weekly_minutes: i64,
    /// Plafond hebdomadaire étendu (template éligible + employé volontaire).
    pub overtime_weekly_minutes: i64,
    /// Plafond quotidien.
    pub max_daily_minutes: i64,
    /// Tolérance de pointage avant retard / départ anticipé.
    pub attendance_tolerance_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_rest_minutes: 480,
            max_weekly_minutes: 48 * 60,
            overtime_weekly_minutes: 60 * 60,
            max_daily_minutes: 12 * 60,
            attendance_tolerance_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictType {
    TimeOverlap,
    InsufficientRest,
    WeeklyHourLimit,
    EmployeeUnavailable,
    DuplicateAssignment,
    InvalidTimeRange,
}

/// Sévérité ordonnée : `max()` donne la sévérité globale d'un résultat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Une violation constatée, avec de quoi l'expliquer à l'appelant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictDetail {
    pub kind: ConflictType,
    pub message: String,
    /// Affectation existante en cause, si identifiable.
    #[serde(default)]
    pub assignment: Option<AssignmentId>,
    pub severity: ConflictSeverity,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Résultat d'une passe de détection. C'est une VALEUR, jamais une erreur :
/// toutes les vérifications tournent et s'accumulent, pas de court-circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResult {
    pub conflicts: Vec<ConflictDetail>,
    pub severity: ConflictSeverity,
    pub summary: String,
}

impl ConflictCheckResult {
    pub fn from_details(conflicts: Vec<ConflictDetail>) -> Self {
        let severity = conflicts
            .iter()
            .map(|d| d.severity)
            .max()
            .unwrap_or(ConflictSeverity::Low);
        let summary = if conflicts.is_empty() {
            "no conflicts".to_string()
        } else {
            format!(
                "{} conflict(s) detected, worst severity {:?}",
                conflicts.len(),
                severity
            )
        };
        Self {
            conflicts,
            severity,
            summary,
        }
    }

    pub fn clean() -> Self {
        Self::from_details(Vec::new())
    }

    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn merged_with(mut self, other: ConflictCheckResult) -> Self {
        self.conflicts.extend(other.conflicts);
        Self::from_details(self.conflicts)
    }
}

impl fmt::Display for ConflictCheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}
