//! Shared types used by both the booking and room-inventory authorities.

mod dates;
mod ids;

pub use dates::{DateRange, DateRangeError};
pub use ids::{BookingId, HotelId, IdempotencyKey, LockId, RoomId, UserId};
