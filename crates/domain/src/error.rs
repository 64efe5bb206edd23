//! Domain error types.

use thiserror::Error;

use crate::booking::BookingStatus;

/// Errors raised by domain state machines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A booking status transition that the state machine forbids.
    #[error("Invalid booking transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// A status string in storage that no variant matches.
    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}
