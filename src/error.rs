use crate::engine::ConflictCheckResult;
use thiserror::Error;

/// Erreurs du noyau de planification.
///
/// Un conflit métier détecté par l'engine n'est PAS une erreur : il circule
/// comme valeur (`ConflictCheckResult`). `PlanError::Conflict` n'apparaît que
/// lorsqu'une opération refuse de valider un commit à cause de ce résultat.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("scheduling conflict: {0}")]
    Conflict(ConflictCheckResult),

    #[error("invalid state transition: {0}")]
    InvalidTransition(&'static str),

    /// Le monde a changé entre la validation et le commit (course perdue).
    /// Réessayable une fois ; une seconde défaite est définitive.
    #[error("execution aborted: {0}")]
    ExecutionAborted(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
