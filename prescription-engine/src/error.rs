use thiserror::Error;
use uuid::Uuid;

/// Domain error taxonomy for the prescription engine.
///
/// Every variant here is recoverable at the API boundary; infrastructure
/// failures are wrapped in [`EngineError::Repository`] by the persistence
/// layer and surfaced without domain detail.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Illegal status transition: {from} -> {to}")]
    StateTransition { from: String, to: String },

    #[error("No staff available for assignment")]
    NoStaffAvailable,

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: Uuid },

    #[error("Concurrent modification: {0}")]
    Concurrency(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl EngineError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error for the given resource type
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource, id }
    }

    /// True for errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repository(_))
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
