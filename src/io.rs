use crate::engine::{AuditFinding, ConflictSeverity, ConflictType};
use crate::model::{Employee, ShiftAssignment, VacationPeriod};
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;

/// Import d'employés depuis CSV: header `handle,display_name[,overtime_opt_in][,vacations]`
pub fn import_employees_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Employee>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let display = rec.get(1).context("missing display_name")?.trim();
        if handle.is_empty() || display.is_empty() {
            bail!("invalid employee row (empty)");
        }
        let mut employee = Employee::new(handle.to_string(), display.to_string());
        if let Some(flag) = rec.get(2) {
            let flag = flag.trim();
            if !flag.is_empty() {
                employee.overtime_opt_in = parse_bool(flag)
                    .with_context(|| format!("invalid overtime_opt_in value for handle {handle}"))?;
            }
        }
        if let Some(ranges) = rec.get(3) {
            let ranges = ranges.trim();
            if !ranges.is_empty() {
                employee.vacations = parse_vacations(ranges)
                    .with_context(|| format!("invalid vacations value for handle {handle}"))?;
            }
        }
        out.push(employee);
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

fn parse_vacations(raw: &str) -> anyhow::Result<Vec<VacationPeriod>> {
    raw.split(';')
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| parse_vacation_chunk(chunk.trim()))
        .collect()
}

fn parse_vacation_chunk(chunk: &str) -> anyhow::Result<VacationPeriod> {
    if let Some((start_raw, end_raw)) = chunk.split_once('/').or_else(|| chunk.split_once("..")) {
        let (start, _) = parse_point(start_raw.trim())?;
        let (mut end, end_was_date) = parse_point(end_raw.trim())?;
        if end_was_date {
            end += Duration::days(1);
        }
        VacationPeriod::new(start, end).map_err(anyhow::Error::msg)
    } else {
        let (start, _) = parse_point(chunk)?;
        let end = start + Duration::days(1);
        VacationPeriod::new(start, end).map_err(anyhow::Error::msg)
    }
}

fn parse_point(raw: &str) -> anyhow::Result<(DateTime<Utc>, bool)> {
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok((dt, false));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date/datetime: {raw}"))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight conversion")?;
    Ok((Utc.from_utc_datetime(&datetime), true))
}

/// Export CSV des affectations:
/// header `id,employee_handle,template,date,start,end,status,planned_hours,actual_hours,overtime_hours`
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    employees: &[Employee],
    assignments: &[ShiftAssignment],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "id",
        "employee_handle",
        "template",
        "date",
        "start",
        "end",
        "status",
        "planned_hours",
        "actual_hours",
        "overtime_hours",
    ])?;
    for a in assignments {
        let handle = employees
            .iter()
            .find(|e| e.id == a.employee)
            .map(|e| e.handle.as_str())
            .unwrap_or("");
        let date = a.date.to_string();
        let start = a.start.to_string();
        let end = a.end.to_string();
        let planned = format!("{:.2}", a.planned_hours());
        let actual = a
            .actual_hours()
            .map(|h| format!("{h:.2}"))
            .unwrap_or_default();
        let overtime = format!("{:.2}", a.overtime_hours());
        w.write_record([
            a.id.as_str(),
            handle,
            a.template_code.as_deref().unwrap_or(""),
            date.as_str(),
            start.as_str(),
            end.as_str(),
            status_label(a),
            planned.as_str(),
            actual.as_str(),
            overtime.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV d'un rapport d'audit:
/// header `employee_handle,type,severity,assignment,message`
pub fn export_conflicts_csv<P: AsRef<Path>>(
    path: P,
    employees: &[Employee],
    findings: &[AuditFinding],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["employee_handle", "type", "severity", "assignment", "message"])?;
    for f in findings {
        let handle = employees
            .iter()
            .find(|e| e.id == f.employee)
            .map(|e| e.handle.as_str())
            .unwrap_or("");
        w.write_record([
            handle,
            conflict_type_label(f.detail.kind),
            severity_label(f.detail.severity),
            f.detail
                .assignment
                .as_ref()
                .map(|a| a.as_str())
                .unwrap_or(""),
            f.detail.message.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn status_label(a: &ShiftAssignment) -> &'static str {
    use crate::model::AssignmentStatus::*;
    match a.status {
        Scheduled => "scheduled",
        CheckedIn => "checked_in",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

/// Libellés stables pour les rapports : le moteur reste muet sur la
/// présentation.
pub fn conflict_type_label(kind: ConflictType) -> &'static str {
    match kind {
        ConflictType::TimeOverlap => "time_overlap",
        ConflictType::InsufficientRest => "insufficient_rest",
        ConflictType::WeeklyHourLimit => "weekly_hour_limit",
        ConflictType::EmployeeUnavailable => "employee_unavailable",
        ConflictType::DuplicateAssignment => "duplicate_assignment",
        ConflictType::InvalidTimeRange => "invalid_time_range",
    }
}

pub fn severity_label(severity: ConflictSeverity) -> &'static str {
    match severity {
        ConflictSeverity::Low => "low",
        ConflictSeverity::Medium => "medium",
        ConflictSeverity::High => "high",
        ConflictSeverity::Critical => "critical",
    }
}
