//! Store error types.

use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// A uniqueness invariant was violated on insert.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A compare-and-swap update found a different version than expected.
    #[error("Version conflict: expected version {expected}")]
    VersionConflict { expected: i64 },

    /// Underlying database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back into the domain.
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] domain::DomainError),
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
