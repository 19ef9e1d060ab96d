use super::util;
use crate::model::ShiftAssignment;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Créneau libre proposé pour un employé un jour donné.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableTimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Durée plaçable dans ce créneau, en minutes.
    pub max_minutes: i64,
    #[serde(default)]
    pub note: Option<String>,
    /// Créneau de fin de journée, préféré car il laisse la nuit libre.
    #[serde(default)]
    pub preferred: bool,
}

/// Créneaux libres d'un employé sur la journée `date` : la journée pleine,
/// moins les affectations non annulées rembourrées du repos minimal de part
/// et d'autre. Les blocs rembourrés sont fusionnés puis les trous parcourus.
pub(super) fn find_available_time_slots(
    cfg: &super::EngineConfig,
    assignments: &[ShiftAssignment],
    date: NaiveDate,
) -> Vec<AvailableTimeSlot> {
    let day_start = Utc.from_utc_datetime(&NaiveDateTime::new(
        date,
        NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default(),
    ));
    let day_end = day_start + Duration::days(1);
    let rest = Duration::minutes(cfg.min_rest_minutes);

    // Blocs occupés rembourrés du repos, tronqués à la journée.
    let mut blocked: Vec<(DateTime<Utc>, DateTime<Utc>)> = assignments
        .iter()
        .filter(|a| !a.is_cancelled())
        .map(|a| {
            let (s, e) = a.interval();
            (s - rest, e + rest)
        })
        .filter(|(s, e)| util::overlaps(*s, *e, day_start, day_end))
        .map(|(s, e)| (s.max(day_start), e.min(day_end)))
        .collect();
    blocked.sort_by_key(|(s, _)| *s);

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for (s, e) in blocked {
        match merged.last_mut() {
            Some((_, last_end)) if s <= *last_end => {
                *last_end = (*last_end).max(e);
            }
            _ => merged.push((s, e)),
        }
    }

    let mut slots = Vec::new();
    let mut cursor = day_start;
    for (s, e) in &merged {
        if cursor < *s {
            slots.push(make_slot(cursor, *s, false));
        }
        cursor = cursor.max(*e);
    }
    if cursor < day_end {
        // Le dernier trou de la journée est marqué préféré.
        slots.push(make_slot(cursor, day_end, true));
    }
    slots
}

fn make_slot(start: DateTime<Utc>, end: DateTime<Utc>, preferred: bool) -> AvailableTimeSlot {
    let max_minutes = (end - start).num_minutes();
    AvailableTimeSlot {
        start,
        end,
        max_minutes,
        note: None,
        preferred,
    }
}

/// Filtre les créneaux capables d'accueillir `required_minutes`, les
/// préférés d'abord puis par heure de début.
pub(super) fn suggest_alternative_time_slots(
    cfg: &super::EngineConfig,
    assignments: &[ShiftAssignment],
    date: NaiveDate,
    required_minutes: i64,
) -> Vec<AvailableTimeSlot> {
    let mut slots: Vec<AvailableTimeSlot> = find_available_time_slots(cfg, assignments, date)
        .into_iter()
        .filter(|s| s.max_minutes >= required_minutes)
        .collect();
    slots.sort_by(|a, b| b.preferred.cmp(&a.preferred).then(a.start.cmp(&b.start)));
    for slot in &mut slots {
        slot.note = Some(format!(
            "fits up to {:.1}h",
            util::minutes_as_hours(slot.max_minutes)
        ));
    }
    slots
}
