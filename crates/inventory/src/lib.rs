//! Room-inventory authority: the reservation engine.
//!
//! The engine owns per-room lock state and is the only serialization
//! point in the system. For a given room, the overlap scan and the lock
//! insert run under one per-room mutex; distinct rooms proceed fully in
//! parallel.

mod engine;
mod error;

pub use engine::{Confirmation, ReservationEngine};
pub use error::{InventoryError, Result};
