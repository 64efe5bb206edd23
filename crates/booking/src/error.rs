//! Orchestrator error types.

use domain::DomainError;
use gateway::GatewayError;
use store::StoreError;
use thiserror::Error;

/// Errors raised by the booking orchestrator.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed or illegal input; never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown booking or room.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No room could be booked for the requested dates.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The inventory side could not be reached; the attempt was
    /// compensated and may be retried with the same idempotency key.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),

    /// Local store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Illegal status transition; indicates a logic bug or a corrupt row.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<GatewayError> for BookingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(msg) => BookingError::Validation(msg),
            GatewayError::NotFound(msg) => BookingError::NotFound(msg),
            GatewayError::Conflict(msg) => BookingError::Conflict(msg),
            GatewayError::Unavailable(msg) => BookingError::Unavailable(msg),
        }
    }
}

/// Convenience alias for orchestrator results.
pub type Result<T> = std::result::Result<T, BookingError>;
