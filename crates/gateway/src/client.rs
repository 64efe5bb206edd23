//! Inventory client trait: the transport seam between the authorities.

use async_trait::async_trait;
use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId};
use domain::Room;
use inventory::Confirmation;
use thiserror::Error;

/// How the remote classified a rejected request.
///
/// Rejections are application answers, not transport failures: they are
/// never retried and never count against the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed dates or arguments.
    Validation,
    /// Unknown room or lock.
    NotFound,
    /// Overlapping dates or an operationally unavailable room.
    Conflict,
}

/// Errors from a single client call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote answered and said no.
    #[error("Remote rejected the request: {message}")]
    Rejected { kind: Rejection, message: String },

    /// The remote could not be reached or did not answer sensibly.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Remote operations exposed by the room-inventory authority.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Lists recommendable rooms, sorted ascending by times-booked
    /// then room id.
    async fn recommend(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<DateRange>,
    ) -> Result<Vec<Room>, ClientError>;

    /// Fetches a room by id.
    async fn get_room(&self, room_id: RoomId) -> Result<Room, ClientError>;

    /// Requests an availability lock on the room for the range.
    async fn confirm_availability(
        &self,
        room_id: RoomId,
        range: DateRange,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<Confirmation, ClientError>;

    /// Confirms the lock and bumps the room's times-booked counter.
    async fn confirm_booking(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
    ) -> Result<(), ClientError>;

    /// Releases the lock for (room, key).
    async fn release(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<(), ClientError>;
}
