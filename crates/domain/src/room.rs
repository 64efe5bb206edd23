//! Room and hotel records owned by the inventory authority.

use common::{HotelId, RoomId};
use serde::{Deserialize, Serialize};

/// A hotel, referenced by its rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub address: Option<String>,
}

impl Hotel {
    /// Creates a new hotel without an address.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HotelId::new(),
            name: name.into(),
            address: None,
        }
    }
}

/// A bookable room.
///
/// `times_booked` is monotonically non-decreasing under normal operation;
/// it is decremented only when a confirmed lock is released as
/// compensation. Updates to the counter go through the store's
/// compare-and-swap on `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub hotel_id: HotelId,
    pub number: String,
    /// Operational availability flag, distinct from date availability.
    pub available: bool,
    pub times_booked: i32,
    pub version: i64,
}

impl Room {
    /// Creates a new available room with a zeroed counter.
    pub fn new(hotel_id: HotelId, number: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(),
            hotel_id,
            number: number.into(),
            available: true,
            times_booked: 0,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_starts_available_and_unbooked() {
        let room = Room::new(HotelId::new(), "101");
        assert!(room.available);
        assert_eq!(room.times_booked, 0);
        assert_eq!(room.version, 0);
    }
}
