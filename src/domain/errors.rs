//! Domain errors for the maestro orchestration engine.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the maestro system.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The user has neither a business profile nor any maturity scores.
    /// Generation must not proceed on an empty context.
    #[error("Insufficient profile context for user {0}: no profile and no maturity scores")]
    InsufficientContext(Uuid),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Step not found: {0}")]
    StepNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Deliverable synthesis failed; the task itself stays completed and the
    /// caller may re-invoke synthesis manually.
    #[error("Deliverable synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
