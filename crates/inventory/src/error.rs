//! Reservation engine error types.

use store::StoreError;
use thiserror::Error;

/// Errors raised by the reservation engine.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Malformed or illegal input; never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown room, hotel, or lock.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Overlapping dates, unavailable room, or duplicate room number.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, InventoryError>;
