//! Domain records for the two authorities.
//!
//! The booking authority owns [`Booking`]; the room-inventory authority
//! owns [`Room`] and [`RoomLock`]. Status transitions are enforced here
//! so no store implementation can resurrect a terminal record.

mod booking;
mod error;
mod lock;
mod room;

pub use booking::{Booking, BookingStatus};
pub use error::DomainError;
pub use lock::RoomLock;
pub use room::{Hotel, Room};
