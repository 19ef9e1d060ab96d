use crate::model::{Employee, EmployeeId, ShiftAssignment};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use tracing::info;

/// Événements émis par le noyau à destination des employés concernés.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    AssignmentCreated,
    AssignmentCancelled,
    CheckedIn,
    CheckedOut,
    SwapRequestCreated,
    SwapTargetAccepted,
    SwapTargetRejected,
    SwapApproved,
    SwapRejected,
    SwapCancelled,
    SwapExpiring,
    SwapExpired,
    SwapExecuted,
    SchedulePublished,
    ScheduleArchived,
}

#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationType,
    pub recipient: EmployeeId,
    pub subject: String,
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Canal de sortie des notifications. Le noyau publie, l'implémentation
/// décide du transport (log, mail, file d'attente).
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: NotificationEvent);
}

/// Sink par défaut : trace structurée, aucun transport externe.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: NotificationEvent) {
        info!(
            kind = ?event.kind,
            recipient = %event.recipient.as_str(),
            subject = %event.subject,
            "notification"
        );
    }
}

/// Sink d'accumulation en mémoire, pour les tests et le mode interactif.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vide et rend tous les événements accumulés.
    pub fn take(&self) -> Vec<NotificationEvent> {
        std::mem::take(&mut self.events.lock().expect("sink lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn publish(&self, event: NotificationEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}

/// Représente un rappel généré pour un employé.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub employee_handle: String,
    pub assignment_id: String,
    pub notice_at: DateTime<Utc>,
    pub content: String,
}

/// Permet de customiser le rendu du message (texte, SMS, etc.).
pub trait ReminderRenderer {
    fn render(
        &self,
        employee: &Employee,
        assignment: &ShiftAssignment,
        notice_at: DateTime<Utc>,
    ) -> String;
}

/// Gabarit texte simple destiné à un futur mail/SMS.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReminder;

impl ReminderRenderer for TextReminder {
    fn render(
        &self,
        employee: &Employee,
        assignment: &ShiftAssignment,
        notice_at: DateTime<Utc>,
    ) -> String {
        let (start, end) = assignment.interval();
        format!(
            "Bonjour {name},\n\nTu es de service \"{label}\" du {start} au {end}.\nCe message est généré le {notice}.\n\nMerci de pointer ton arrivée à l'heure.\n",
            name = employee.display_name,
            label = assignment.template_code.as_deref().unwrap_or("manuel"),
            start = start.to_rfc3339(),
            end = end.to_rfc3339(),
            notice = notice_at.to_rfc3339()
        )
    }
}

/// Prépare un rappel pour la prochaine vacation d'un employé.
pub fn prepare_reminder(
    employees: &[Employee],
    assignments: &[ShiftAssignment],
    handle: &str,
    days_before: i64,
    now: DateTime<Utc>,
    renderer: &dyn ReminderRenderer,
) -> Result<Reminder> {
    if days_before < 0 {
        bail!("days_before must be positive");
    }

    let employee = employees
        .iter()
        .find(|e| e.handle == handle)
        .with_context(|| format!("unknown employee handle: {handle}"))?;

    let mut upcoming: Vec<&ShiftAssignment> = assignments
        .iter()
        .filter(|a| a.employee == employee.id && !a.is_cancelled() && a.interval().0 >= now)
        .collect();

    if upcoming.is_empty() {
        bail!("no upcoming shift found for handle {handle}");
    }

    upcoming.sort_by_key(|a| a.interval().0);
    let assignment = upcoming[0];

    let notice_at = assignment.interval().0 - Duration::days(days_before);

    let content = renderer.render(employee, assignment, notice_at);
    Ok(Reminder {
        employee_handle: employee.handle.clone(),
        assignment_id: assignment.id.as_str().to_string(),
        notice_at,
        content,
    })
}
