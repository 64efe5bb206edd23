//! Durable stores for both authorities.
//!
//! The booking authority persists [`domain::Booking`] rows through
//! [`BookingStore`]; the inventory authority persists rooms and locks
//! through [`RoomStore`] + [`RoomLockStore`]. Each side ships an
//! in-memory implementation (tests, demos) and a PostgreSQL
//! implementation with the same observable behavior: unique
//! idempotency keys, unique (room, key) lock rows, and
//! compare-and-swap version updates.

mod booking;
mod error;
mod inventory;
mod memory;
mod postgres;

pub use booking::BookingStore;
pub use error::{Result, StoreError};
pub use inventory::{RoomLockStore, RoomStore};
pub use memory::{MemoryBookingStore, MemoryInventoryStore};
pub use postgres::{PostgresBookingStore, PostgresInventoryStore};
