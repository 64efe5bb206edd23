//! Gateway error taxonomy surfaced to the orchestrator.

use thiserror::Error;

use crate::client::{ClientError, Rejection};

/// Typed outcome of a gateway-wrapped remote call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote rejected the arguments; never retried.
    #[error("Validation error from inventory service: {0}")]
    Validation(String),

    /// The remote does not know the room or lock.
    #[error("Not found at inventory service: {0}")]
    NotFound(String),

    /// Overlapping dates or an unavailable room.
    #[error("Conflict from inventory service: {0}")]
    Conflict(String),

    /// Retries exhausted or the circuit is open.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub(crate) fn from_rejection(kind: Rejection, message: String) -> Self {
        match kind {
            Rejection::Validation => GatewayError::Validation(message),
            Rejection::NotFound => GatewayError::NotFound(message),
            Rejection::Conflict => GatewayError::Conflict(message),
        }
    }
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rejected { kind, message } => GatewayError::from_rejection(kind, message),
            ClientError::Transport(msg) => GatewayError::Unavailable(msg),
        }
    }
}
