use super::types::{ConflictCheckResult, ConflictDetail, ConflictSeverity, ConflictType};
use super::{util, AuditFinding, EmployeeSnapshot, Proposal};
use crate::error::{PlanError, PlanResult};
use crate::model::{build_interval, Employee, ShiftAssignment};
use chrono::Duration;
use std::collections::BTreeMap;

/// Durées plancher/plafond d'une fenêtre proposée, en minutes.
const MIN_WINDOW_MINUTES: i64 = 15;
const MAX_WINDOW_MINUTES: i64 = 24 * 60;

/// Passe complète : toutes les vérifications tournent et s'accumulent pour
/// que l'appelant voie chaque violation d'un coup. Erreur uniquement sur
/// entrée malformée, jamais pour un conflit.
pub(super) fn check_all(
    cfg: &super::EngineConfig,
    snap: &EmployeeSnapshot<'_>,
    p: &Proposal,
) -> PlanResult<ConflictCheckResult> {
    if p.start == p.end {
        return Err(PlanError::Validation(
            "proposed window cannot be empty (start == end)".to_string(),
        ));
    }
    if p.planned_minutes < 0 {
        return Err(PlanError::Validation(
            "proposed hours cannot be negative".to_string(),
        ));
    }

    let (p_start, p_end) = build_interval(p.date, p.start, p.end);
    let mut details = Vec::new();

    if p.planned_minutes < MIN_WINDOW_MINUTES || p.planned_minutes > MAX_WINDOW_MINUTES {
        details.push(ConflictDetail {
            kind: ConflictType::InvalidTimeRange,
            message: format!(
                "planned window of {:.2}h is outside the 15min-24h bounds",
                util::minutes_as_hours(p.planned_minutes)
            ),
            assignment: None,
            severity: ConflictSeverity::Critical,
            suggestion: Some("adjust the shift window before scheduling".to_string()),
        });
    }

    let others: Vec<&ShiftAssignment> = snap
        .assignments
        .iter()
        .filter(|a| !a.is_cancelled() && p.exclude.as_ref() != Some(&a.id))
        .collect();

    // Doublon exact : même jour, même heure de début planifiée.
    for a in &others {
        if a.date == p.date && a.start == p.start {
            details.push(ConflictDetail {
                kind: ConflictType::DuplicateAssignment,
                message: format!(
                    "an assignment already starts at {} on {}",
                    p.start, p.date
                ),
                assignment: Some(a.id.clone()),
                severity: ConflictSeverity::Critical,
                suggestion: Some("update the existing assignment instead".to_string()),
            });
        }
    }

    // Chevauchement, vacations de nuit comprises : l'arithmétique
    // d'intervalles UTC couvre les jours adjacents sans test de date.
    for a in &others {
        let (a_start, a_end) = a.interval();
        if util::overlaps(a_start, a_end, p_start, p_end) {
            details.push(ConflictDetail {
                kind: ConflictType::TimeOverlap,
                message: format!(
                    "overlaps shift {} from {} to {}",
                    a.template_code.as_deref().unwrap_or(a.id.as_str()),
                    a_start.to_rfc3339(),
                    a_end.to_rfc3339()
                ),
                assignment: Some(a.id.clone()),
                severity: ConflictSeverity::Critical,
                suggestion: Some("pick another window or move the existing shift".to_string()),
            });
        }
    }

    // Repos minimal dans les deux directions temporelles.
    for a in &others {
        let (a_start, a_end) = a.interval();
        if util::overlaps(a_start, a_end, p_start, p_end) {
            continue;
        }
        let gap = if a_start >= p_end {
            a_start - p_end
        } else {
            p_start - a_end
        };
        let gap_min = gap.num_minutes();
        if gap_min < cfg.min_rest_minutes {
            details.push(ConflictDetail {
                kind: ConflictType::InsufficientRest,
                message: format!(
                    "only {:.1}h of rest against shift {} (minimum {:.1}h)",
                    util::minutes_as_hours(gap_min),
                    a.template_code.as_deref().unwrap_or(a.id.as_str()),
                    util::minutes_as_hours(cfg.min_rest_minutes)
                ),
                assignment: Some(a.id.clone()),
                severity: rest_severity(gap_min),
                suggestion: Some(format!(
                    "leave at least {:.1}h between shifts",
                    util::minutes_as_hours(cfg.min_rest_minutes)
                )),
            });
        }
    }

    // Plafond hebdomadaire, semaine ancrée au lundi de la date proposée.
    let week_start = util::week_monday(p.date);
    let week_end = week_start + Duration::days(6);
    let week_minutes: i64 = others
        .iter()
        .filter(|a| a.date >= week_start && a.date <= week_end)
        .map(|a| a.planned_minutes)
        .sum();
    let cap = if p.overtime_allowed {
        cfg.overtime_weekly_minutes
    } else {
        cfg.max_weekly_minutes
    };
    let total = week_minutes + p.planned_minutes;
    if total > cap {
        let remaining = (cap - week_minutes).max(0);
        details.push(ConflictDetail {
            kind: ConflictType::WeeklyHourLimit,
            message: format!(
                "weekly total would reach {:.1}h (cap {:.1}h)",
                util::minutes_as_hours(total),
                util::minutes_as_hours(cap)
            ),
            assignment: None,
            severity: ConflictSeverity::Medium,
            suggestion: Some(if remaining > 0 {
                format!(
                    "at most {:.1}h can still be scheduled this week",
                    util::minutes_as_hours(remaining)
                )
            } else {
                "no additional hours available this week".to_string()
            }),
        });
    }

    // Plafond quotidien, même type de conflit que l'hebdo.
    let daily: i64 = others
        .iter()
        .filter(|a| a.date == p.date)
        .map(|a| a.planned_minutes)
        .sum::<i64>()
        + p.planned_minutes;
    if daily > cfg.max_daily_minutes {
        details.push(ConflictDetail {
            kind: ConflictType::WeeklyHourLimit,
            message: format!(
                "daily total would reach {:.1}h (limit {:.1}h)",
                util::minutes_as_hours(daily),
                util::minutes_as_hours(cfg.max_daily_minutes)
            ),
            assignment: None,
            severity: ConflictSeverity::High,
            suggestion: Some("reduce the hours scheduled on this day".to_string()),
        });
    }

    // Indisponibilités déclarées de l'employé.
    for vac in &snap.employee.vacations {
        if p_start < vac.end && vac.start < p_end {
            details.push(ConflictDetail {
                kind: ConflictType::EmployeeUnavailable,
                message: format!(
                    "{} is unavailable from {} to {}",
                    snap.employee.handle,
                    vac.start.to_rfc3339(),
                    vac.end.to_rfc3339()
                ),
                assignment: None,
                severity: ConflictSeverity::High,
                suggestion: Some("pick another employee or another date".to_string()),
            });
        }
    }

    Ok(ConflictCheckResult::from_details(details))
}

fn rest_severity(gap_min: i64) -> ConflictSeverity {
    if gap_min < 120 {
        ConflictSeverity::Critical
    } else if gap_min < 240 {
        ConflictSeverity::High
    } else {
        ConflictSeverity::Medium
    }
}

/// Valide un échange dans les deux sens : chaque employé doit pouvoir
/// absorber la fenêtre de l'autre, sa propre affectation étant exclue
/// puisqu'il la cède.
pub(super) fn check_swap(
    cfg: &super::EngineConfig,
    requester: &EmployeeSnapshot<'_>,
    requester_assignment: &ShiftAssignment,
    requester_overtime: bool,
    target: &EmployeeSnapshot<'_>,
    target_assignment: &ShiftAssignment,
    target_overtime: bool,
) -> PlanResult<ConflictCheckResult> {
    let requester_side = check_all(
        cfg,
        requester,
        &Proposal {
            date: target_assignment.date,
            start: target_assignment.start,
            end: target_assignment.end,
            planned_minutes: target_assignment.planned_minutes,
            overtime_allowed: requester_overtime,
            exclude: Some(requester_assignment.id.clone()),
        },
    )?;
    let target_side = check_all(
        cfg,
        target,
        &Proposal {
            date: requester_assignment.date,
            start: requester_assignment.start,
            end: requester_assignment.end,
            planned_minutes: requester_assignment.planned_minutes,
            overtime_allowed: target_overtime,
            exclude: Some(target_assignment.id.clone()),
        },
    )?;
    Ok(requester_side.merged_with(target_side))
}

/// Audit des affectations existantes : paires (i < j) par employé pour le
/// chevauchement et le repos, totaux par semaine pour le plafond.
pub(super) fn audit(
    cfg: &super::EngineConfig,
    employees: &[Employee],
    assignments: &[ShiftAssignment],
) -> Vec<AuditFinding> {
    let mut findings = Vec::new();

    for employee in employees {
        let mut shifts: Vec<&ShiftAssignment> = assignments
            .iter()
            .filter(|a| a.employee == employee.id && !a.is_cancelled())
            .collect();
        shifts.sort_by_key(|a| a.interval().0);

        for (idx, a) in shifts.iter().enumerate() {
            for b in shifts.iter().skip(idx + 1) {
                let (a_start, a_end) = a.interval();
                let (b_start, b_end) = b.interval();
                if util::overlaps(a_start, a_end, b_start, b_end) {
                    findings.push(AuditFinding {
                        employee: employee.id.clone(),
                        detail: ConflictDetail {
                            kind: ConflictType::TimeOverlap,
                            message: format!(
                                "assignments {} and {} overlap",
                                a.id.as_str(),
                                b.id.as_str()
                            ),
                            assignment: Some(b.id.clone()),
                            severity: ConflictSeverity::Critical,
                            suggestion: None,
                        },
                    });
                    continue;
                }
                let rest = (b_start - a_end).num_minutes();
                if rest >= 0 && rest < cfg.min_rest_minutes {
                    findings.push(AuditFinding {
                        employee: employee.id.clone(),
                        detail: ConflictDetail {
                            kind: ConflictType::InsufficientRest,
                            message: format!(
                                "only {:.1}h of rest between {} and {}",
                                util::minutes_as_hours(rest),
                                a.id.as_str(),
                                b.id.as_str()
                            ),
                            assignment: Some(b.id.clone()),
                            severity: rest_severity(rest),
                            suggestion: None,
                        },
                    });
                }
            }
        }

        // Totaux hebdomadaires.
        let mut weeks: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
        for a in &shifts {
            *weeks.entry(util::week_monday(a.date)).or_default() += a.planned_minutes;
        }
        let cap = if employee.overtime_opt_in {
            cfg.overtime_weekly_minutes
        } else {
            cfg.max_weekly_minutes
        };
        for (monday, minutes) in weeks {
            if minutes > cap {
                findings.push(AuditFinding {
                    employee: employee.id.clone(),
                    detail: ConflictDetail {
                        kind: ConflictType::WeeklyHourLimit,
                        message: format!(
                            "week of {} totals {:.1}h (cap {:.1}h)",
                            monday,
                            util::minutes_as_hours(minutes),
                            util::minutes_as_hours(cap)
                        ),
                        assignment: None,
                        severity: ConflictSeverity::Medium,
                        suggestion: None,
                    },
                });
            }
        }
    }

    findings
}
