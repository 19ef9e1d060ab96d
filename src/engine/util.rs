use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Deux intervalles semi-ouverts [a,b) et [c,d) se chevauchent
/// ssi `a < d && c < b`.
pub(super) fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Lundi de la semaine ISO contenant `date`.
pub(super) fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub(super) fn minutes_as_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}
