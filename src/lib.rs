#![forbid(unsafe_code)]
//! Roulement — bibliothèque de planification de vacations locale (sans BD).
//!
//! - Stockage fichiers (JSON/CSV).
//! - Templates de vacations, affectation automatique par roulement.
//! - Détection de conflits (chevauchements, repos, plafonds horaires).
//! - Échanges de vacations négociés (cible puis manager), exécution atomique.
//! - Plannings nommés avec cycle de vie Draft → Published → Archived.
//! - Tout en UTC ; parsing RFC3339 ; affichage local en dehors de la lib.

pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod notification;
pub mod schedule;
pub mod stats;
pub mod storage;
pub mod store;
pub mod swap;
pub mod template;

pub use engine::{
    AvailableTimeSlot, ConflictCheckResult, ConflictDetail, ConflictEngine, ConflictSeverity,
    ConflictType, EngineConfig,
};
pub use error::{PlanError, PlanResult};
pub use model::{
    AssignmentId, AssignmentStatus, AttendanceStatus, Employee, EmployeeId, ManagerResponse,
    Priority, ScheduleId, ScheduleKind, ScheduleStatus, ShiftAssignment, ShiftSchedule,
    ShiftSwapRequest, SwapId, SwapStatus, TargetResponse, VacationPeriod,
};
pub use notification::{
    prepare_reminder, LogSink, MemorySink, NotificationEvent, NotificationSink, NotificationType,
    Reminder, ReminderRenderer, TextReminder,
};
pub use schedule::{GenerationReport, RotationEntry, ScheduleManager, ScheduleUpdate};
pub use storage::{JsonStorage, Planning, Storage, Workspace};
pub use store::{AssignmentStore, AutoAssignReport, NewAssignment};
pub use swap::{NewSwapRequest, SwapWorkflow};
pub use template::{NewTemplate, ShiftTemplate, TemplateCatalog, TemplateUpdate};
