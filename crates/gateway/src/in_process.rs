//! In-process client wrapping the reservation engine directly.

use std::sync::Arc;

use async_trait::async_trait;
use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId};
use domain::Room;
use inventory::{Confirmation, InventoryError, ReservationEngine};
use store::{RoomLockStore, RoomStore};

use crate::client::{ClientError, InventoryClient, Rejection};

/// [`InventoryClient`] backed by an engine in the same process.
///
/// Used by tests and single-process deployments; the gateway's retry
/// and breaker machinery behaves identically over it.
pub struct InProcessInventoryClient<S> {
    engine: Arc<ReservationEngine<S>>,
}

impl<S> InProcessInventoryClient<S> {
    pub fn new(engine: Arc<ReservationEngine<S>>) -> Self {
        Self { engine }
    }
}

fn map_error(err: InventoryError) -> ClientError {
    let message = err.to_string();
    match err {
        InventoryError::Validation(_) => ClientError::Rejected {
            kind: Rejection::Validation,
            message,
        },
        InventoryError::NotFound { .. } => ClientError::Rejected {
            kind: Rejection::NotFound,
            message,
        },
        InventoryError::Conflict(_) => ClientError::Rejected {
            kind: Rejection::Conflict,
            message,
        },
        InventoryError::Store(_) => ClientError::Transport(message),
    }
}

#[async_trait]
impl<S> InventoryClient for InProcessInventoryClient<S>
where
    S: RoomStore + RoomLockStore + Send + Sync,
{
    async fn recommend(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<DateRange>,
    ) -> Result<Vec<Room>, ClientError> {
        self.engine.recommend(hotel_id, range).await.map_err(map_error)
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Room, ClientError> {
        self.engine.get_room(room_id).await.map_err(map_error)
    }

    async fn confirm_availability(
        &self,
        room_id: RoomId,
        range: DateRange,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<Confirmation, ClientError> {
        self.engine
            .confirm_availability(room_id, range, idempotency_key, booking_id)
            .await
            .map_err(map_error)
    }

    async fn confirm_booking(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
    ) -> Result<(), ClientError> {
        self.engine
            .confirm_booking(room_id, idempotency_key)
            .await
            .map_err(map_error)
    }

    async fn release(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<(), ClientError> {
        self.engine
            .release_room(room_id, idempotency_key, booking_id)
            .await
            .map_err(map_error)
    }
}
