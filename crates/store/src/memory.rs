//! In-memory store implementations for tests and single-process demos.
//!
//! These mirror the observable behavior of the PostgreSQL stores:
//! uniqueness constraints, compare-and-swap versioning, and ordering.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, DateRange, HotelId, IdempotencyKey, LockId, RoomId, UserId};
use domain::{Booking, Hotel, Room, RoomLock};
use tokio::sync::RwLock;

use crate::{BookingStore, Result, RoomLockStore, RoomStore, StoreError};

/// In-memory booking store.
#[derive(Clone, Default)]
pub struct MemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl MemoryBookingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored bookings.
    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    /// Returns true if the store holds no bookings.
    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert(&self, booking: Booking) -> Result<Booking> {
        let mut bookings = self.bookings.write().await;
        if bookings
            .values()
            .any(|b| b.idempotency_key == booking.idempotency_key)
        {
            return Err(StoreError::DuplicateKey(format!(
                "idempotency key {}",
                booking.idempotency_key
            )));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn find_by_id_and_user(
        &self,
        id: BookingId,
        user_id: UserId,
    ) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .find(|b| &b.idempotency_key == key)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn update(&self, booking: &Booking) -> Result<Booking> {
        let mut bookings = self.bookings.write().await;
        let stored = bookings
            .get_mut(&booking.id)
            .ok_or(StoreError::NotFound {
                resource: "booking",
            })?;
        if stored.version != booking.version {
            return Err(StoreError::VersionConflict {
                expected: booking.version,
            });
        }
        let mut updated = booking.clone();
        updated.version += 1;
        updated.updated_at = Some(Utc::now());
        *stored = updated.clone();
        Ok(updated)
    }
}

#[derive(Default)]
struct InventoryState {
    hotels: HashMap<HotelId, Hotel>,
    rooms: HashMap<RoomId, Room>,
    locks: HashMap<LockId, RoomLock>,
}

/// In-memory room + lock store.
#[derive(Clone, Default)]
pub struct MemoryInventoryStore {
    state: Arc<RwLock<InventoryState>>,
}

impl MemoryInventoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored locks.
    pub async fn lock_count(&self) -> usize {
        self.state.read().await.locks.len()
    }

    /// Returns all locks for a room, for test assertions.
    pub async fn locks_for_room(&self, room_id: RoomId) -> Vec<RoomLock> {
        self.state
            .read()
            .await
            .locks
            .values()
            .filter(|l| l.room_id == room_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RoomStore for MemoryInventoryStore {
    async fn insert_hotel(&self, hotel: Hotel) -> Result<Hotel> {
        self.state
            .write()
            .await
            .hotels
            .insert(hotel.id, hotel.clone());
        Ok(hotel)
    }

    async fn get_hotel(&self, id: HotelId) -> Result<Option<Hotel>> {
        Ok(self.state.read().await.hotels.get(&id).cloned())
    }

    async fn insert_room(&self, room: Room) -> Result<Room> {
        let mut state = self.state.write().await;
        if state
            .rooms
            .values()
            .any(|r| r.hotel_id == room.hotel_id && r.number == room.number)
        {
            return Err(StoreError::DuplicateKey(format!(
                "room number {} in hotel {}",
                room.number, room.hotel_id
            )));
        }
        state.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.state.read().await.rooms.get(&id).cloned())
    }

    async fn update_room(&self, room: &Room) -> Result<Room> {
        let mut state = self.state.write().await;
        let stored = state
            .rooms
            .get_mut(&room.id)
            .ok_or(StoreError::NotFound { resource: "room" })?;
        if stored.version != room.version {
            return Err(StoreError::VersionConflict {
                expected: room.version,
            });
        }
        let mut updated = room.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool> {
        Ok(self.state.write().await.rooms.remove(&id).is_some())
    }

    async fn available_rooms(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<&DateRange>,
    ) -> Result<Vec<Room>> {
        let state = self.state.read().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|r| r.available)
            .filter(|r| hotel_id.is_none_or(|h| r.hotel_id == h))
            .filter(|r| {
                range.is_none_or(|range| {
                    !state
                        .locks
                        .values()
                        .any(|l| l.room_id == r.id && l.range.overlaps(range))
                })
            })
            .cloned()
            .collect();
        rooms.sort_by(|a, b| (a.times_booked, a.id).cmp(&(b.times_booked, b.id)));
        Ok(rooms)
    }
}

#[async_trait]
impl RoomLockStore for MemoryInventoryStore {
    async fn insert_lock(&self, lock: RoomLock) -> Result<RoomLock> {
        let mut state = self.state.write().await;
        if state
            .locks
            .values()
            .any(|l| l.room_id == lock.room_id && l.idempotency_key == lock.idempotency_key)
        {
            return Err(StoreError::DuplicateKey(format!(
                "lock for room {} with key {}",
                lock.room_id, lock.idempotency_key
            )));
        }
        state.locks.insert(lock.id, lock.clone());
        Ok(lock)
    }

    async fn find_lock(&self, room_id: RoomId, key: &IdempotencyKey) -> Result<Option<RoomLock>> {
        Ok(self
            .state
            .read()
            .await
            .locks
            .values()
            .find(|l| l.room_id == room_id && &l.idempotency_key == key)
            .cloned())
    }

    async fn overlapping_locks(&self, room_id: RoomId, range: &DateRange) -> Result<Vec<RoomLock>> {
        Ok(self
            .state
            .read()
            .await
            .locks
            .values()
            .filter(|l| l.room_id == room_id && l.range.overlaps(range))
            .cloned()
            .collect())
    }

    async fn confirm_lock(&self, id: LockId) -> Result<()> {
        let mut state = self.state.write().await;
        let lock = state
            .locks
            .get_mut(&id)
            .ok_or(StoreError::NotFound { resource: "lock" })?;
        lock.confirmed = true;
        Ok(())
    }

    async fn delete_lock(&self, id: LockId) -> Result<bool> {
        Ok(self.state.write().await.locks.remove(&id).is_some())
    }

    async fn delete_locks_for_room(&self, room_id: RoomId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.locks.len();
        state.locks.retain(|_, l| l.room_id != room_id);
        Ok((before - state.locks.len()) as u64)
    }

    async fn delete_unconfirmed_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.locks.len();
        state
            .locks
            .retain(|_, l| l.confirmed || l.created_at >= cutoff);
        Ok((before - state.locks.len()) as u64)
    }
}
