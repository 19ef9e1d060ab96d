use crate::engine::{ConflictCheckResult, EmployeeSnapshot, Proposal};
use crate::error::{PlanError, PlanResult};
use crate::model::{
    EmployeeId, ScheduleId, ScheduleKind, ScheduleStatus, ShiftSchedule,
};
use crate::notification::{NotificationEvent, NotificationSink, NotificationType};
use crate::store::{AssignmentStore, NewAssignment};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Un poste du roulement : quel employé sur quel template.
#[derive(Debug, Clone)]
pub struct RotationEntry {
    pub employee: EmployeeId,
    pub template_code: String,
}

/// Créneau laissé vacant pendant une génération.
#[derive(Debug, Clone)]
pub struct SkippedSlot {
    pub date: NaiveDate,
    pub employee: EmployeeId,
    pub reason: String,
}

/// Bilan d'une génération de planning.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub schedule: ShiftSchedule,
    pub created: usize,
    pub skipped: Vec<SkippedSlot>,
}

/// Champs modifiables d'un planning en brouillon.
#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Cycle de vie des plannings nommés.
///
/// Un planning `Primary` est exclusif sur sa période ; les `Extra` se
/// superposent librement. La publication revalide chaque affectation
/// contenue : un planning publié est garanti sans conflit au moment de la
/// publication.
pub struct ScheduleManager {
    schedules: RwLock<Vec<ShiftSchedule>>,
    store: Arc<AssignmentStore>,
    sink: Arc<dyn NotificationSink>,
}

impl ScheduleManager {
    pub fn new(store: Arc<AssignmentStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            schedules: RwLock::new(Vec::new()),
            store,
            sink,
        }
    }

    pub fn from_parts(
        schedules: Vec<ShiftSchedule>,
        store: Arc<AssignmentStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            schedules: RwLock::new(schedules),
            store,
            sink,
        }
    }

    pub fn create(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        kind: ScheduleKind,
        created_by: EmployeeId,
    ) -> PlanResult<ShiftSchedule> {
        let schedule = ShiftSchedule::new(name, start_date, end_date, kind, created_by)?;
        let mut schedules = self.schedules.write().expect("schedule lock poisoned");
        if kind == ScheduleKind::Primary {
            if let Some(other) = schedules.iter().find(|s| {
                s.kind == ScheduleKind::Primary
                    && s.status != ScheduleStatus::Cancelled
                    && s.overlaps_range(start_date, end_date)
            }) {
                return Err(PlanError::Validation(format!(
                    "primary schedule {} already covers this period",
                    other.name
                )));
            }
        }
        debug!(id = %schedule.id.as_str(), name, "schedule created");
        schedules.push(schedule.clone());
        Ok(schedule)
    }

    /// Modifie un planning encore en brouillon.
    pub fn update(&self, id: &ScheduleId, update: ScheduleUpdate) -> PlanResult<ShiftSchedule> {
        let mut schedules = self.schedules.write().expect("schedule lock poisoned");
        let exclusive_clash = {
            let current = schedules
                .iter()
                .find(|s| &s.id == id)
                .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))?;
            if !current.is_editable() {
                return Err(PlanError::InvalidTransition(
                    "only a Draft schedule can be edited",
                ));
            }
            let start = update.start_date.unwrap_or(current.start_date);
            let end = update.end_date.unwrap_or(current.end_date);
            if end < start {
                return Err(PlanError::Validation(
                    "schedule end date must not precede start date".to_string(),
                ));
            }
            current.kind == ScheduleKind::Primary
                && schedules.iter().any(|s| {
                    &s.id != id
                        && s.kind == ScheduleKind::Primary
                        && s.status != ScheduleStatus::Cancelled
                        && s.overlaps_range(start, end)
                })
        };
        if exclusive_clash {
            return Err(PlanError::Validation(
                "another primary schedule covers this period".to_string(),
            ));
        }
        let schedule = schedules
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(PlanError::Validation(
                    "schedule name cannot be empty".to_string(),
                ));
            }
            schedule.name = name;
        }
        if let Some(description) = update.description {
            schedule.description = description;
        }
        if let Some(start) = update.start_date {
            schedule.start_date = start;
        }
        if let Some(end) = update.end_date {
            schedule.end_date = end;
        }
        Ok(schedule.clone())
    }

    /// Publication : revalide chaque affectation contenue contre le reste du
    /// monde. Le moindre conflit agrégé bloque, le planning reste en
    /// brouillon.
    pub fn publish(
        &self,
        id: &ScheduleId,
        by: EmployeeId,
        now: DateTime<Utc>,
    ) -> PlanResult<ShiftSchedule> {
        let current = self.get(id)?;
        if current.status != ScheduleStatus::Draft {
            return Err(PlanError::InvalidTransition(
                "only a Draft schedule can be published",
            ));
        }

        let contained = self.store.by_schedule(id);
        let mut aggregate = ConflictCheckResult::clean();
        for assignment in contained.iter().filter(|a| !a.is_cancelled()) {
            let employee = self.store.employee(&assignment.employee)?;
            let own = self.store.by_employee(&employee.id);
            let overtime_allowed = assignment
                .template_code
                .as_deref()
                .and_then(|code| self.store.catalog().get(code))
                .map(|t| t.overtime_eligible && employee.overtime_opt_in)
                .unwrap_or(false);
            let result = self.store.engine().check(
                &EmployeeSnapshot {
                    employee: &employee,
                    assignments: &own,
                },
                &Proposal {
                    date: assignment.date,
                    start: assignment.start,
                    end: assignment.end,
                    planned_minutes: assignment.planned_minutes,
                    overtime_allowed,
                    exclude: Some(assignment.id.clone()),
                },
            )?;
            aggregate = aggregate.merged_with(result);
        }
        if aggregate.has_conflict() {
            return Err(PlanError::Conflict(aggregate));
        }

        let published = {
            let mut schedules = self.schedules.write().expect("schedule lock poisoned");
            let schedule = schedules
                .iter_mut()
                .find(|s| &s.id == id)
                .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))?;
            if schedule.status != ScheduleStatus::Draft {
                return Err(PlanError::InvalidTransition(
                    "only a Draft schedule can be published",
                ));
            }
            schedule.status = ScheduleStatus::Published;
            schedule.published_by = Some(by);
            schedule.published_at = Some(now);
            schedule.assignment_count = contained.iter().filter(|a| !a.is_cancelled()).count();
            schedule.clone()
        };
        info!(id = %published.id.as_str(), "schedule published");

        let mut recipients: Vec<EmployeeId> =
            contained.iter().map(|a| a.employee.clone()).collect();
        recipients.sort();
        recipients.dedup();
        for recipient in recipients {
            self.emit(
                NotificationType::SchedulePublished,
                &recipient,
                now,
                format!("schedule {} published", published.name),
                format!(
                    "the schedule covering {} to {} is now official",
                    published.start_date, published.end_date
                ),
            );
        }
        Ok(published)
    }

    /// Archivage d'un planning publié dont la période est écoulée.
    /// `force` permet d'archiver avant terme.
    pub fn archive(
        &self,
        id: &ScheduleId,
        now: DateTime<Utc>,
        force: bool,
    ) -> PlanResult<ShiftSchedule> {
        let archived = {
            let mut schedules = self.schedules.write().expect("schedule lock poisoned");
            let schedule = schedules
                .iter_mut()
                .find(|s| &s.id == id)
                .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))?;
            if schedule.status != ScheduleStatus::Published {
                return Err(PlanError::InvalidTransition(
                    "only a Published schedule can be archived",
                ));
            }
            if !force && now.date_naive() <= schedule.end_date {
                return Err(PlanError::Validation(
                    "schedule period has not elapsed yet".to_string(),
                ));
            }
            schedule.status = ScheduleStatus::Archived;
            schedule.archived_at = Some(now);
            schedule.clone()
        };
        self.emit(
            NotificationType::ScheduleArchived,
            &archived.created_by,
            now,
            format!("schedule {} archived", archived.name),
            "the schedule is now read-only history".to_string(),
        );
        Ok(archived)
    }

    /// Abandon d'un planning, depuis `Draft` ou `Published`.
    pub fn cancel(&self, id: &ScheduleId) -> PlanResult<ShiftSchedule> {
        let mut schedules = self.schedules.write().expect("schedule lock poisoned");
        let schedule = schedules
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))?;
        if !matches!(
            schedule.status,
            ScheduleStatus::Draft | ScheduleStatus::Published
        ) {
            return Err(PlanError::InvalidTransition(
                "only a Draft or Published schedule can be cancelled",
            ));
        }
        schedule.status = ScheduleStatus::Cancelled;
        Ok(schedule.clone())
    }

    // ---- génération ----

    /// Génère un planning hebdomadaire en brouillon : chaque poste du
    /// roulement est affecté chaque jour de la semaine. Un poste en conflit
    /// est sauté et consigné, jamais bloquant.
    pub fn generate_weekly(
        &self,
        name: &str,
        week_start: NaiveDate,
        rotation: &[RotationEntry],
        created_by: EmployeeId,
        now: DateTime<Utc>,
    ) -> PlanResult<GenerationReport> {
        let week_end = week_start + Duration::days(6);
        self.generate(name, week_start, week_end, rotation, created_by, now)
    }

    /// Génère un planning sur le mois civil de `any_day`.
    pub fn generate_monthly(
        &self,
        name: &str,
        any_day: NaiveDate,
        rotation: &[RotationEntry],
        created_by: EmployeeId,
        now: DateTime<Utc>,
    ) -> PlanResult<GenerationReport> {
        let first = any_day
            .with_day(1)
            .ok_or_else(|| PlanError::Validation("invalid month start".to_string()))?;
        let next_month = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        };
        let last = next_month
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| PlanError::Validation("invalid month end".to_string()))?;
        self.generate(name, first, last, rotation, created_by, now)
    }

    fn generate(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        rotation: &[RotationEntry],
        created_by: EmployeeId,
        now: DateTime<Utc>,
    ) -> PlanResult<GenerationReport> {
        if rotation.is_empty() {
            return Err(PlanError::Validation(
                "cannot generate a schedule from an empty rotation".to_string(),
            ));
        }
        let schedule = self.create(name, start, end, ScheduleKind::Primary, created_by)?;

        let mut created = 0usize;
        let mut skipped = Vec::new();
        let mut date = start;
        while date <= end {
            for entry in rotation {
                match self.store.create(
                    NewAssignment {
                        employee: entry.employee.clone(),
                        date,
                        template: Some(entry.template_code.clone()),
                        start: None,
                        end: None,
                        schedule: Some(schedule.id.clone()),
                        notes: None,
                    },
                    now,
                ) {
                    Ok(_) => created += 1,
                    Err(PlanError::Conflict(result)) => skipped.push(SkippedSlot {
                        date,
                        employee: entry.employee.clone(),
                        reason: result.summary,
                    }),
                    Err(other) => return Err(other),
                }
            }
            date = match date.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }
        self.refresh_assignment_count(&schedule.id)?;
        let schedule = self.get(&schedule.id)?;
        info!(
            id = %schedule.id.as_str(),
            created,
            skipped = skipped.len(),
            "schedule generated"
        );
        Ok(GenerationReport {
            schedule,
            created,
            skipped,
        })
    }

    // ---- requêtes ----

    pub fn get(&self, id: &ScheduleId) -> PlanResult<ShiftSchedule> {
        self.schedules
            .read()
            .expect("schedule lock poisoned")
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))
    }

    /// Plannings `Primary` non annulés chevauchant [start, end].
    pub fn find_overlapping(&self, start: NaiveDate, end: NaiveDate) -> Vec<ShiftSchedule> {
        self.schedules
            .read()
            .expect("schedule lock poisoned")
            .iter()
            .filter(|s| {
                s.kind == ScheduleKind::Primary
                    && s.status != ScheduleStatus::Cancelled
                    && s.overlaps_range(start, end)
            })
            .cloned()
            .collect()
    }

    pub fn refresh_assignment_count(&self, id: &ScheduleId) -> PlanResult<usize> {
        let count = self
            .store
            .by_schedule(id)
            .iter()
            .filter(|a| !a.is_cancelled())
            .count();
        let mut schedules = self.schedules.write().expect("schedule lock poisoned");
        let schedule = schedules
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| PlanError::NotFound(format!("schedule {}", id.as_str())))?;
        schedule.assignment_count = count;
        Ok(count)
    }

    pub fn snapshot(&self) -> Vec<ShiftSchedule> {
        self.schedules
            .read()
            .expect("schedule lock poisoned")
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
