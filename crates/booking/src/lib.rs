//! Booking authority: the saga orchestrator.
//!
//! [`BookingOrchestrator`] owns booking records and drives the
//! two-authority saga: persist locally as pending, confirm availability
//! through the resilient gateway, then confirm or compensate. Local
//! state is the source of truth for bookings; the inventory side is the
//! source of truth for rooms and locks.

mod error;
mod orchestrator;

pub use error::{BookingError, Result};
pub use orchestrator::{BookingOrchestrator, CreateBookingRequest};
