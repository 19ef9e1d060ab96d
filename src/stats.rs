use crate::model::{
    AssignmentStatus, AttendanceStatus, EmployeeId, ShiftAssignment, ShiftSwapRequest, SwapStatus,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Bilan d'heures d'un employé sur une période. Tout est compté en minutes,
/// les accesseurs convertissent en heures décimales pour l'affichage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkingHoursSummary {
    pub employee: Option<EmployeeId>,
    pub total_shifts: usize,
    pub completed_shifts: usize,
    pub cancelled_shifts: usize,
    pub no_shows: usize,
    pub late_arrivals: usize,
    pub early_leaves: usize,
    pub planned_minutes: i64,
    pub actual_minutes: i64,
    pub overtime_minutes: i64,
}

impl WorkingHoursSummary {
    pub fn planned_hours(&self) -> f64 {
        self.planned_minutes as f64 / 60.0
    }

    pub fn actual_hours(&self) -> f64 {
        self.actual_minutes as f64 / 60.0
    }

    pub fn overtime_hours(&self) -> f64 {
        self.overtime_minutes as f64 / 60.0
    }

    /// Part des vacations non annulées effectivement honorées.
    pub fn attendance_rate(&self) -> f64 {
        let held = self.total_shifts - self.cancelled_shifts;
        if held == 0 {
            return 1.0;
        }
        self.completed_shifts as f64 / held as f64
    }
}

/// Répartition des affectations d'une période, tous employés confondus.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentStatistics {
    pub total: usize,
    pub scheduled: usize,
    pub checked_in: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_shows: usize,
    pub distinct_employees: usize,
    pub planned_minutes: i64,
    pub actual_minutes: i64,
}

/// Répartition des demandes d'échange.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SwapStatistics {
    pub total: usize,
    pub live: usize,
    pub executed: usize,
    pub rejected: usize,
    pub cancelled: usize,
    pub expired: usize,
    pub emergencies: usize,
}

/// Bilan d'heures d'un employé sur [from, to].
pub fn working_hours_summary(
    assignments: &[ShiftAssignment],
    employee: &EmployeeId,
    from: NaiveDate,
    to: NaiveDate,
) -> WorkingHoursSummary {
    let mut summary = WorkingHoursSummary {
        employee: Some(employee.clone()),
        ..WorkingHoursSummary::default()
    };
    for a in assignments
        .iter()
        .filter(|a| &a.employee == employee && a.date >= from && a.date <= to)
    {
        summary.total_shifts += 1;
        match a.status {
            AssignmentStatus::Completed => summary.completed_shifts += 1,
            AssignmentStatus::Cancelled => summary.cancelled_shifts += 1,
            AssignmentStatus::NoShow => summary.no_shows += 1,
            _ => {}
        }
        match a.attendance {
            AttendanceStatus::Late => summary.late_arrivals += 1,
            AttendanceStatus::EarlyLeave => summary.early_leaves += 1,
            _ => {}
        }
        if !a.is_cancelled() {
            summary.planned_minutes += a.planned_minutes;
        }
        summary.actual_minutes += a.actual_minutes.unwrap_or(0);
        summary.overtime_minutes += a.overtime_minutes;
    }
    summary
}

/// Répartition des affectations sur [from, to].
pub fn assignment_statistics(
    assignments: &[ShiftAssignment],
    from: NaiveDate,
    to: NaiveDate,
) -> AssignmentStatistics {
    let mut stats = AssignmentStatistics::default();
    let mut employees: Vec<&EmployeeId> = Vec::new();
    for a in assignments.iter().filter(|a| a.date >= from && a.date <= to) {
        stats.total += 1;
        match a.status {
            AssignmentStatus::Scheduled => stats.scheduled += 1,
            AssignmentStatus::CheckedIn => stats.checked_in += 1,
            AssignmentStatus::Completed => stats.completed += 1,
            AssignmentStatus::Cancelled => stats.cancelled += 1,
            AssignmentStatus::NoShow => stats.no_shows += 1,
        }
        if !a.is_cancelled() {
            stats.planned_minutes += a.planned_minutes;
        }
        stats.actual_minutes += a.actual_minutes.unwrap_or(0);
        if !employees.contains(&&a.employee) {
            employees.push(&a.employee);
        }
    }
    stats.distinct_employees = employees.len();
    stats
}

/// Répartition des demandes d'échange.
pub fn swap_statistics(requests: &[ShiftSwapRequest]) -> SwapStatistics {
    let mut stats = SwapStatistics::default();
    for r in requests {
        stats.total += 1;
        if r.is_live() {
            stats.live += 1;
        }
        match r.status {
            SwapStatus::Executed => stats.executed += 1,
            SwapStatus::TargetRejected | SwapStatus::ManagerRejected => stats.rejected += 1,
            SwapStatus::Cancelled => stats.cancelled += 1,
            SwapStatus::Expired => stats.expired += 1,
            _ => {}
        }
        if r.emergency {
            stats.emergencies += 1;
        }
    }
    stats
}

/// Affectations terminées avec des heures supplémentaires sur [from, to].
pub fn overtime_assignments(
    assignments: &[ShiftAssignment],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<ShiftAssignment> {
    assignments
        .iter()
        .filter(|a| {
            a.date >= from
                && a.date <= to
                && a.status == AssignmentStatus::Completed
                && a.overtime_minutes > 0
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Employee;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn working_hours_count_only_this_employee_and_period() {
        let marie = Employee::new("mdupont", "Marie Dupont");
        let paul = Employee::new("pmartin", "Paul Martin");
        let mut a = crate::model::ShiftAssignment::new(marie.id.clone(), d(2), t(6), t(14)).unwrap();
        a.check_in(Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap(), 15)
            .unwrap();
        a.check_out(Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap(), 15)
            .unwrap();
        let b = crate::model::ShiftAssignment::new(paul.id.clone(), d(2), t(6), t(14)).unwrap();
        let out_of_range =
            crate::model::ShiftAssignment::new(marie.id.clone(), d(20), t(6), t(14)).unwrap();

        let summary =
            working_hours_summary(&[a, b, out_of_range], &marie.id, d(1), d(7));
        assert_eq!(summary.total_shifts, 1);
        assert_eq!(summary.completed_shifts, 1);
        assert_eq!(summary.planned_minutes, 480);
        assert_eq!(summary.actual_minutes, 540);
        assert_eq!(summary.overtime_minutes, 60);
        assert!((summary.attendance_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cancelled_shifts_drop_out_of_planned_minutes() {
        let marie = Employee::new("mdupont", "Marie Dupont");
        let mut a = crate::model::ShiftAssignment::new(marie.id.clone(), d(2), t(6), t(14)).unwrap();
        a.cancel("sick leave").unwrap();
        let summary = working_hours_summary(&[a], &marie.id, d(1), d(7));
        assert_eq!(summary.total_shifts, 1);
        assert_eq!(summary.cancelled_shifts, 1);
        assert_eq!(summary.planned_minutes, 0);
        assert!((summary.attendance_rate() - 1.0).abs() < f64::EPSILON);
    }
}
