use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] acompaniar_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] acompaniar_core::error::CoreError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited, retry in {wait_seconds}s")]
    RateLimited { wait_seconds: u64 },

    #[error("No valid recipients")]
    NoRecipients,

    #[error("Could not record alert: {0}")]
    AuditFailure(String),

    #[error("Contact limit of {max} reached")]
    LimitExceeded { max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        Self::DatabaseError(err.into())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
