//! Room and room-lock store traits for the inventory authority.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DateRange, HotelId, IdempotencyKey, LockId, RoomId};
use domain::{Hotel, Room, RoomLock};

use crate::Result;

/// Durable store for hotels and rooms.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Inserts a hotel.
    async fn insert_hotel(&self, hotel: Hotel) -> Result<Hotel>;

    /// Finds a hotel by id.
    async fn get_hotel(&self, id: HotelId) -> Result<Option<Hotel>>;

    /// Inserts a room. Fails with [`crate::StoreError::DuplicateKey`] if
    /// the hotel already has a room with this number.
    async fn insert_room(&self, room: Room) -> Result<Room>;

    /// Finds a room by id.
    async fn get_room(&self, id: RoomId) -> Result<Option<Room>>;

    /// Updates a room with compare-and-swap on `room.version`. Used for
    /// the `times_booked` counter.
    async fn update_room(&self, room: &Room) -> Result<Room>;

    /// Deletes a room. Returns false if it did not exist. Callers must
    /// delete dependent locks first; there is no implicit cascade.
    async fn delete_room(&self, id: RoomId) -> Result<bool>;

    /// Lists operationally available rooms sorted ascending by
    /// `times_booked`, tie-broken by ascending room id. When `range` is
    /// given, rooms with any overlapping lock are excluded.
    async fn available_rooms(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<&DateRange>,
    ) -> Result<Vec<Room>>;
}

/// Durable store for room locks.
#[async_trait]
pub trait RoomLockStore: Send + Sync {
    /// Inserts a lock. Fails with [`crate::StoreError::DuplicateKey`] if
    /// a lock with the same (room, idempotency key) already exists.
    async fn insert_lock(&self, lock: RoomLock) -> Result<RoomLock>;

    /// Finds the lock for (room, idempotency key).
    async fn find_lock(&self, room_id: RoomId, key: &IdempotencyKey) -> Result<Option<RoomLock>>;

    /// Returns all locks for the room whose ranges overlap `range`
    /// under the inclusive-both-ends rule.
    async fn overlapping_locks(&self, room_id: RoomId, range: &DateRange) -> Result<Vec<RoomLock>>;

    /// Marks a lock confirmed.
    async fn confirm_lock(&self, id: LockId) -> Result<()>;

    /// Deletes a lock. Returns false if it did not exist.
    async fn delete_lock(&self, id: LockId) -> Result<bool>;

    /// Deletes all locks for a room; the first half of the explicit
    /// two-step room delete. Returns the number deleted.
    async fn delete_locks_for_room(&self, room_id: RoomId) -> Result<u64>;

    /// Deletes unconfirmed locks created before `cutoff`. Returns the
    /// number deleted.
    async fn delete_unconfirmed_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
