use crate::error::PlanError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiant fort pour Employee (fourni par l'identité externe, opaque ici)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifiant fort pour ShiftAssignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifiant fort pour ShiftSchedule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(String);

impl ScheduleId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifiant fort pour ShiftSwapRequest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapId(String);

impl SwapId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Période d'indisponibilité d'un employé (intervalle UTC [start, end)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl VacationPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if end <= start {
            return Err("vacation end must be after start".to_string());
        }
        Ok(Self { start, end })
    }
}

/// Projection minimale de l'identité externe : ce que l'engine doit savoir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub handle: String,
    pub display_name: String,
    /// L'employé a accepté le régime d'heures supplémentaires (plafond hebdo étendu).
    #[serde(default)]
    pub overtime_opt_in: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vacations: Vec<VacationPeriod>,
}

impl Employee {
    pub fn new<H: Into<String>, D: Into<String>>(handle: H, display_name: D) -> Self {
        Self {
            id: EmployeeId::random(),
            handle: handle.into(),
            display_name: display_name.into(),
            overtime_opt_in: false,
            vacations: Vec::new(),
        }
    }
}

/// Statut d'une affectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Scheduled,
    CheckedIn,
    Completed,
    Cancelled,
    NoShow,
}

/// Statut de présence, dérivé des pointages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Pending,
    Present,
    Late,
    EarlyLeave,
    Absent,
}

/// Affectation d'un employé à une vacation datée.
///
/// Les champs du template sont copiés à la création (snapshot) : modifier ou
/// désactiver le template ensuite ne touche jamais une affectation existante.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: AssignmentId,
    pub employee: EmployeeId,
    /// Code du template d'origine, ou None pour un créneau saisi à la main.
    #[serde(default)]
    pub template_code: Option<String>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    /// `end <= start` signifie que la vacation franchit minuit (fin le lendemain).
    pub end: NaiveTime,
    pub planned_minutes: i64,
    #[serde(default)]
    pub break_minutes: i64,
    pub status: AssignmentStatus,
    pub attendance: AttendanceStatus,
    #[serde(default)]
    pub check_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_minutes: Option<i64>,
    #[serde(default)]
    pub overtime_minutes: i64,
    #[serde(default)]
    pub schedule: Option<ScheduleId>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ShiftAssignment {
    /// Crée une affectation en validant la fenêtre horaire.
    /// `end == start` est rejeté ; `end < start` est une vacation de nuit.
    pub fn new(
        employee: EmployeeId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, PlanError> {
        if start == end {
            return Err(PlanError::Validation(
                "assignment window cannot be empty (start == end)".to_string(),
            ));
        }
        let planned_minutes = window_minutes(start, end);
        Ok(Self {
            id: AssignmentId::random(),
            employee,
            template_code: None,
            date,
            start,
            end,
            planned_minutes,
            break_minutes: 0,
            status: AssignmentStatus::Scheduled,
            attendance: AttendanceStatus::Pending,
            check_in_at: None,
            check_out_at: None,
            actual_minutes: None,
            overtime_minutes: 0,
            schedule: None,
            notes: None,
        })
    }

    /// Intervalle UTC [start, end) de la vacation, minuit géré.
    pub fn interval(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        build_interval(self.date, self.start, self.end)
    }

    pub fn planned_hours(&self) -> f64 {
        self.planned_minutes as f64 / 60.0
    }

    pub fn actual_hours(&self) -> Option<f64> {
        self.actual_minutes.map(|m| m as f64 / 60.0)
    }

    pub fn overtime_hours(&self) -> f64 {
        self.overtime_minutes as f64 / 60.0
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == AssignmentStatus::Cancelled
    }

    /// Pointage d'arrivée. Uniquement depuis `Scheduled`.
    /// Arrivée plus de `tolerance_min` minutes après l'heure prévue ⇒ `Late`.
    pub fn check_in(&mut self, now: DateTime<Utc>, tolerance_min: i64) -> Result<(), PlanError> {
        if self.status != AssignmentStatus::Scheduled {
            return Err(PlanError::InvalidTransition(
                "check-in requires a Scheduled assignment",
            ));
        }
        let (planned_start, _) = self.interval();
        self.check_in_at = Some(now);
        self.status = AssignmentStatus::CheckedIn;
        self.attendance = if now > planned_start + Duration::minutes(tolerance_min) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        };
        Ok(())
    }

    /// Pointage de sortie. Uniquement depuis `CheckedIn`.
    /// Calcule heures réelles (pause déduite) et heures supplémentaires.
    pub fn check_out(&mut self, now: DateTime<Utc>, tolerance_min: i64) -> Result<(), PlanError> {
        if self.status != AssignmentStatus::CheckedIn {
            return Err(PlanError::InvalidTransition(
                "check-out requires a CheckedIn assignment",
            ));
        }
        let check_in_at = self.check_in_at.ok_or(PlanError::InvalidTransition(
            "check-out without a recorded check-in",
        ))?;
        if now <= check_in_at {
            return Err(PlanError::Validation(
                "check-out must be after check-in".to_string(),
            ));
        }
        let worked = ((now - check_in_at).num_minutes() - self.break_minutes).max(0);
        self.check_out_at = Some(now);
        self.actual_minutes = Some(worked);
        self.overtime_minutes = (worked - self.planned_minutes).max(0);
        self.status = AssignmentStatus::Completed;
        let (_, planned_end) = self.interval();
        if now < planned_end - Duration::minutes(tolerance_min) {
            self.attendance = AttendanceStatus::EarlyLeave;
        }
        Ok(())
    }

    /// Annulation douce. Une affectation terminée ne s'annule pas.
    pub fn cancel(&mut self, reason: &str) -> Result<(), PlanError> {
        if matches!(
            self.status,
            AssignmentStatus::Completed | AssignmentStatus::Cancelled
        ) {
            return Err(PlanError::InvalidTransition(
                "cannot cancel a completed or already cancelled assignment",
            ));
        }
        self.status = AssignmentStatus::Cancelled;
        self.attendance = AttendanceStatus::Absent;
        let note = format!("cancelled: {reason}");
        self.notes = Some(match self.notes.take() {
            Some(prev) => format!("{prev}\n{note}"),
            None => note,
        });
        Ok(())
    }

    /// Marque l'absence d'un employé jamais pointé une fois la vacation passée.
    pub fn mark_no_show(&mut self) -> Result<(), PlanError> {
        if self.status != AssignmentStatus::Scheduled {
            return Err(PlanError::InvalidTransition(
                "no-show only applies to a Scheduled assignment",
            ));
        }
        self.status = AssignmentStatus::NoShow;
        self.attendance = AttendanceStatus::Absent;
        Ok(())
    }
}

/// Statut d'un planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Draft,
    Published,
    Archived,
    Cancelled,
}

/// `Primary` : roulement principal, exclusif sur sa période.
/// `Extra` : plannings additionnels (renfort, événement), superposables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleKind {
    Primary,
    Extra,
}

/// Planning nommé regroupant des affectations sur une période.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftSchedule {
    pub id: ScheduleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: ScheduleKind,
    pub status: ScheduleStatus,
    pub created_by: EmployeeId,
    #[serde(default)]
    pub published_by: Option<EmployeeId>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    /// Compteur dénormalisé, entretenu par le ScheduleManager.
    #[serde(default)]
    pub assignment_count: usize,
}

impl ShiftSchedule {
    pub fn new(
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        kind: ScheduleKind,
        created_by: EmployeeId,
    ) -> Result<Self, PlanError> {
        if name.trim().is_empty() {
            return Err(PlanError::Validation(
                "schedule name cannot be empty".to_string(),
            ));
        }
        if end_date < start_date {
            return Err(PlanError::Validation(
                "schedule end date must not precede start date".to_string(),
            ));
        }
        Ok(Self {
            id: ScheduleId::random(),
            name: name.to_string(),
            description: None,
            start_date,
            end_date,
            kind,
            status: ScheduleStatus::Draft,
            created_by,
            published_by: None,
            published_at: None,
            archived_at: None,
            assignment_count: 0,
        })
    }

    pub fn is_editable(&self) -> bool {
        self.status == ScheduleStatus::Draft
    }

    pub fn overlaps_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// Statut d'une demande d'échange. Terminaux : `TargetRejected`,
/// `ManagerRejected`, `Executed`, `Cancelled`, `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapStatus {
    Pending,
    TargetAccepted,
    TargetRejected,
    ManagerApproved,
    ManagerRejected,
    Executed,
    Cancelled,
    Expired,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SwapStatus::TargetRejected
                | SwapStatus::ManagerRejected
                | SwapStatus::Executed
                | SwapStatus::Cancelled
                | SwapStatus::Expired
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetResponse {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerResponse {
    Approved,
    Rejected,
}

/// Demande d'échange de vacations entre deux employés.
///
/// La demande référence deux affectations pendant la négociation mais ne les
/// possède jamais : seule l'exécution, via l'AssignmentStore, mute leurs
/// propriétaires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftSwapRequest {
    pub id: SwapId,
    pub requester: EmployeeId,
    pub requester_assignment: AssignmentId,
    pub target_employee: EmployeeId,
    /// None = demande ouverte ; la cible désigne son affectation en acceptant.
    #[serde(default)]
    pub target_assignment: Option<AssignmentId>,
    pub status: SwapStatus,
    pub priority: Priority,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub request_reason: Option<String>,
    #[serde(default)]
    pub target_reason: Option<String>,
    #[serde(default)]
    pub manager_reason: Option<String>,
    #[serde(default)]
    pub approved_by: Option<EmployeeId>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShiftSwapRequest {
    pub fn new(
        requester: EmployeeId,
        requester_assignment: AssignmentId,
        target_employee: EmployeeId,
        target_assignment: Option<AssignmentId>,
        priority: Priority,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, PlanError> {
        if requester == target_employee {
            return Err(PlanError::Validation(
                "cannot request a swap with oneself".to_string(),
            ));
        }
        if expires_at <= now {
            return Err(PlanError::Validation(
                "swap expiry must be in the future".to_string(),
            ));
        }
        Ok(Self {
            id: SwapId::random(),
            requester,
            requester_assignment,
            target_employee,
            target_assignment,
            status: SwapStatus::Pending,
            priority,
            emergency: false,
            request_reason: None,
            target_reason: None,
            manager_reason: None,
            approved_by: None,
            expires_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Réponse de l'employé cible. Uniquement depuis `Pending`.
    pub fn respond_by_target(
        &mut self,
        response: TargetResponse,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PlanError> {
        if self.status != SwapStatus::Pending {
            return Err(PlanError::InvalidTransition(
                "target response requires a Pending request",
            ));
        }
        self.target_reason = reason;
        self.status = match response {
            TargetResponse::Accepted => SwapStatus::TargetAccepted,
            TargetResponse::Rejected => SwapStatus::TargetRejected,
        };
        self.updated_at = now;
        Ok(())
    }

    /// Décision du manager. Uniquement depuis `TargetAccepted`.
    pub fn respond_by_manager(
        &mut self,
        manager: EmployeeId,
        response: ManagerResponse,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PlanError> {
        if self.status != SwapStatus::TargetAccepted {
            return Err(PlanError::InvalidTransition(
                "manager decision requires a TargetAccepted request",
            ));
        }
        self.manager_reason = reason;
        self.approved_by = Some(manager);
        self.status = match response {
            ManagerResponse::Approved => SwapStatus::ManagerApproved,
            ManagerResponse::Rejected => SwapStatus::ManagerRejected,
        };
        self.updated_at = now;
        Ok(())
    }

    /// Bascule `ManagerApproved → Executed` une fois l'échange commité.
    pub fn mark_executed(&mut self, now: DateTime<Utc>) -> Result<(), PlanError> {
        if self.status != SwapStatus::ManagerApproved {
            return Err(PlanError::InvalidTransition(
                "execution requires a ManagerApproved request",
            ));
        }
        self.status = SwapStatus::Executed;
        self.updated_at = now;
        Ok(())
    }

    /// Annulation par le demandeur, avant décision du manager.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), PlanError> {
        if !matches!(self.status, SwapStatus::Pending | SwapStatus::TargetAccepted) {
            return Err(PlanError::InvalidTransition(
                "only a Pending or TargetAccepted request can be cancelled",
            ));
        }
        self.status = SwapStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Expiration par le balayage périodique. Toute demande vivante peut
    /// expirer, y compris `ManagerApproved` après une exécution avortée ;
    /// refuser les états terminaux rend le balayage rejouable.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), PlanError> {
        if self.status.is_terminal() {
            return Err(PlanError::InvalidTransition(
                "a terminal request cannot expire",
            ));
        }
        self.status = SwapStatus::Expired;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Minutes d'une fenêtre [start, end), minuit franchi si `end <= start`.
pub fn window_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let (s, e) = build_interval(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), start, end);
    (e - s).num_minutes()
}

/// Construit l'intervalle UTC d'une fenêtre datée, fin reportée au lendemain
/// si `end <= start`.
pub fn build_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_dt = Utc.from_utc_datetime(&NaiveDateTime::new(date, start));
    let mut end_date = date;
    if end <= start {
        end_date = end_date.succ_opt().unwrap_or(end_date);
    }
    let end_dt = Utc.from_utc_datetime(&NaiveDateTime::new(end_date, end));
    (start_dt, end_dt)
}
