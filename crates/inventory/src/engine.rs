//! The reservation engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId};
use domain::{Hotel, Room, RoomLock};
use serde::{Deserialize, Serialize};
use store::{RoomLockStore, RoomStore, StoreError};

use crate::error::{InventoryError, Result};

/// Bounded retries for the times-booked counter compare-and-swap.
const COUNTER_CAS_ATTEMPTS: u32 = 3;

/// Outcome of a successful availability confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    pub room_id: RoomId,
    pub idempotency_key: IdempotencyKey,
    pub range: DateRange,
    pub confirmed: bool,
    pub message: String,
}

/// The room reservation engine.
///
/// Guarantees that for any room, the set of locks with overlapping
/// ranges and distinct idempotency keys has cardinality at most one.
/// The guarantee holds because the overlap scan and the lock insert
/// execute under a mutex keyed by room id; the per-room critical
/// section is the only place that window is closed.
pub struct ReservationEngine<S> {
    store: S,
    room_gates: Mutex<HashMap<RoomId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S> ReservationEngine<S>
where
    S: RoomStore + RoomLockStore,
{
    /// Creates an engine over a room + lock store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            room_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the serialization gate for a room, creating it on first
    /// touch. The table is never pruned; one entry per room ever seen.
    fn gate(&self, room_id: RoomId) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.room_gates.lock().unwrap_or_else(|e| e.into_inner());
        gates.entry(room_id).or_default().clone()
    }

    fn replay_response(room_id: RoomId, lock: &RoomLock) -> Confirmation {
        Confirmation {
            room_id,
            idempotency_key: lock.idempotency_key.clone(),
            range: lock.range,
            confirmed: true,
            message: "Already confirmed (idempotent replay)".to_string(),
        }
    }

    /// Confirms availability and locks the room for the range.
    ///
    /// A replay carrying an idempotency key the room has already seen
    /// returns confirmed without re-evaluating overlap: it must not
    /// re-lock or double count. A first-time call validates the range,
    /// then scans for overlaps and inserts the lock inside the room's
    /// critical section.
    #[tracing::instrument(skip(self), fields(room_id = %room_id, key = %idempotency_key))]
    pub async fn confirm_availability(
        &self,
        room_id: RoomId,
        range: DateRange,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<Confirmation> {
        if let Some(lock) = self.store.find_lock(room_id, &idempotency_key).await? {
            tracing::info!("request already processed, returning existing lock");
            return Ok(Self::replay_response(room_id, &lock));
        }

        range
            .validate(Utc::now().date_naive())
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let gate = self.gate(room_id);
        let _guard = gate.lock().await;

        // A racing call with the same key may have inserted between the
        // unguarded check and here.
        if let Some(lock) = self.store.find_lock(room_id, &idempotency_key).await? {
            return Ok(Self::replay_response(room_id, &lock));
        }

        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(InventoryError::NotFound { resource: "room" })?;

        if !room.available {
            return Err(InventoryError::Conflict(
                "Room is not operationally available".to_string(),
            ));
        }

        let overlapping = self.store.overlapping_locks(room_id, &range).await?;
        if !overlapping.is_empty() {
            metrics::counter!("room_lock_conflicts_total").increment(1);
            tracing::warn!(%range, "room already locked for requested dates");
            return Err(InventoryError::Conflict(format!(
                "Room {room_id} is not available for {range}"
            )));
        }

        let lock = RoomLock::unconfirmed(room_id, range, idempotency_key.clone(), booking_id);
        self.store.insert_lock(lock).await?;

        metrics::counter!("room_locks_acquired_total").increment(1);
        tracing::info!(%range, "room locked");

        Ok(Confirmation {
            room_id,
            idempotency_key,
            range,
            confirmed: true,
            message: "Room availability confirmed and locked".to_string(),
        })
    }

    /// Marks the lock confirmed and increments the room's times-booked
    /// counter. Confirming an already-confirmed lock is a no-op; the
    /// counter is never incremented twice for one key.
    #[tracing::instrument(skip(self), fields(room_id = %room_id, key = %idempotency_key))]
    pub async fn confirm_booking(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
    ) -> Result<()> {
        let gate = self.gate(room_id);
        let _guard = gate.lock().await;

        let lock = self
            .store
            .find_lock(room_id, &idempotency_key)
            .await?
            .ok_or(InventoryError::NotFound { resource: "lock" })?;

        if lock.confirmed {
            tracing::info!("lock already confirmed, skipping counter increment");
            return Ok(());
        }

        self.store.confirm_lock(lock.id).await?;
        self.adjust_times_booked(room_id, 1).await?;

        metrics::counter!("bookings_confirmed_total").increment(1);
        tracing::info!("booking confirmed");
        Ok(())
    }

    /// Releases the lock for (room, key). Succeeds silently when no
    /// lock exists. Releasing a confirmed lock decrements the
    /// times-booked counter (floored at zero) as compensation before
    /// the lock row is deleted.
    #[tracing::instrument(skip(self), fields(room_id = %room_id, key = %idempotency_key))]
    pub async fn release_room(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
        _booking_id: Option<BookingId>,
    ) -> Result<()> {
        let gate = self.gate(room_id);
        let _guard = gate.lock().await;

        let Some(lock) = self.store.find_lock(room_id, &idempotency_key).await? else {
            tracing::info!("no lock found, possibly already released");
            return Ok(());
        };

        if lock.confirmed {
            tracing::warn!("releasing a confirmed lock, decrementing times_booked");
            self.adjust_times_booked(room_id, -1).await?;
        }

        self.store.delete_lock(lock.id).await?;
        metrics::counter!("room_locks_released_total").increment(1);
        tracing::info!("room released");
        Ok(())
    }

    /// Adjusts the counter through the store's compare-and-swap,
    /// retrying a bounded number of times on version conflicts from
    /// concurrent room updates outside the engine.
    async fn adjust_times_booked(&self, room_id: RoomId, delta: i32) -> Result<()> {
        for attempt in 1..=COUNTER_CAS_ATTEMPTS {
            let mut room = self
                .store
                .get_room(room_id)
                .await?
                .ok_or(InventoryError::NotFound { resource: "room" })?;
            room.times_booked = (room.times_booked + delta).max(0);

            match self.store.update_room(&room).await {
                Ok(_) => return Ok(()),
                Err(StoreError::VersionConflict { .. }) if attempt < COUNTER_CAS_ATTEMPTS => {
                    tracing::debug!(attempt, "times_booked CAS conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        unreachable!("loop returns on final attempt")
    }

    /// Lists available rooms sorted ascending by times-booked, then
    /// room id. A supplied range is validated and excludes rooms with
    /// any overlapping lock.
    pub async fn recommend(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<DateRange>,
    ) -> Result<Vec<Room>> {
        if let Some(range) = &range {
            range
                .validate(Utc::now().date_naive())
                .map_err(|e| InventoryError::Validation(e.to_string()))?;
        }
        Ok(self.store.available_rooms(hotel_id, range.as_ref()).await?)
    }

    /// Fetches a room by id.
    pub async fn get_room(&self, room_id: RoomId) -> Result<Room> {
        self.store
            .get_room(room_id)
            .await?
            .ok_or(InventoryError::NotFound { resource: "room" })
    }

    /// Creates a room in an existing hotel.
    #[tracing::instrument(skip(self))]
    pub async fn create_room(&self, hotel_id: HotelId, number: String) -> Result<Room> {
        self.store
            .get_hotel(hotel_id)
            .await?
            .ok_or(InventoryError::NotFound { resource: "hotel" })?;

        match self.store.insert_room(Room::new(hotel_id, number)).await {
            Ok(room) => {
                tracing::info!(room_id = %room.id, "room created");
                Ok(room)
            }
            Err(StoreError::DuplicateKey(msg)) => Err(InventoryError::Conflict(format!(
                "Room already exists: {msg}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a hotel.
    #[tracing::instrument(skip(self, name, address))]
    pub async fn create_hotel(&self, name: String, address: Option<String>) -> Result<Hotel> {
        let mut hotel = Hotel::new(name);
        hotel.address = address;
        let hotel = self.store.insert_hotel(hotel).await?;
        tracing::info!(hotel_id = %hotel.id, "hotel created");
        Ok(hotel)
    }

    /// Deletes a room and its locks. Locks go first: the schema has no
    /// cascade, and the order matches the foreign-key dependency.
    #[tracing::instrument(skip(self))]
    pub async fn delete_room(&self, room_id: RoomId) -> Result<()> {
        let gate = self.gate(room_id);
        let _guard = gate.lock().await;

        if self.store.get_room(room_id).await?.is_none() {
            return Err(InventoryError::NotFound { resource: "room" });
        }

        let removed = self.store.delete_locks_for_room(room_id).await?;
        self.store.delete_room(room_id).await?;
        tracing::info!(locks_removed = removed, "room deleted");
        Ok(())
    }

    /// Deletes unconfirmed locks older than `ttl`. Returns the number
    /// removed. Callers schedule this; the engine does not.
    pub async fn purge_stale_locks(&self, ttl: Duration) -> Result<u64> {
        let removed = self
            .store
            .delete_unconfirmed_older_than(Utc::now() - ttl)
            .await?;
        if removed > 0 {
            tracing::info!(removed, "purged stale unconfirmed locks");
        }
        Ok(removed)
    }
}
