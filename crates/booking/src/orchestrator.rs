//! The booking saga orchestrator.

use chrono::{NaiveDate, Utc};
use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId, UserId};
use domain::{Booking, BookingStatus};
use gateway::{InventoryClient, ResilientGateway};
use serde::Deserialize;
use store::{BookingStore, StoreError};

use crate::error::{BookingError, Result};

/// Parameters for creating a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    /// Required unless `auto_select` is set.
    pub room_id: Option<RoomId>,
    pub hotel_id: Option<HotelId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Replay token; generated when the caller omits it.
    pub idempotency_key: Option<IdempotencyKey>,
    /// Pick the least-booked available room instead of a specific one.
    #[serde(default)]
    pub auto_select: bool,
}

/// Drives the two-authority booking saga.
///
/// The happy path persists the booking as pending, asks the inventory
/// side to confirm availability, and flips the booking to confirmed.
/// On a rejected or unreachable confirmation the booking is cancelled
/// and the room released: the saga compensates rather than holding a
/// distributed transaction open.
pub struct BookingOrchestrator<B, C> {
    store: B,
    gateway: ResilientGateway<C>,
}

impl<B, C> BookingOrchestrator<B, C>
where
    B: BookingStore,
    C: InventoryClient,
{
    /// Creates an orchestrator over a booking store and a gateway.
    pub fn new(store: B, gateway: ResilientGateway<C>) -> Self {
        Self { store, gateway }
    }

    /// Creates a booking, running the full saga.
    ///
    /// A replay carrying a known idempotency key returns the stored
    /// booking in whatever state the earlier run left it, without
    /// touching the inventory side again.
    #[tracing::instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_booking(
        &self,
        user_id: UserId,
        request: CreateBookingRequest,
    ) -> Result<Booking> {
        let key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(IdempotencyKey::generate);

        if let Some(existing) = self.store.find_by_idempotency_key(&key).await? {
            tracing::info!(booking_id = %existing.id, status = %existing.status, "idempotent replay");
            return Ok(existing);
        }

        let range = DateRange::new(request.start_date, request.end_date)
            .map_err(|e| BookingError::Validation(e.to_string()))?;
        range
            .validate(Utc::now().date_naive())
            .map_err(|e| BookingError::Validation(e.to_string()))?;

        let (room_id, hotel_id) = self.select_room(&request, range).await?;

        let booking = Booking::pending(user_id, room_id, hotel_id, range, key.clone());
        let booking = match self.store.insert(booking).await {
            Ok(b) => b,
            Err(StoreError::DuplicateKey(_)) => {
                // Lost the insert race to a concurrent request with the
                // same key; the winner's row is the answer.
                return self
                    .store
                    .find_by_idempotency_key(&key)
                    .await?
                    .ok_or_else(|| BookingError::NotFound(format!("booking for key {key}")));
            }
            Err(e) => return Err(e.into()),
        };

        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(booking_id = %booking.id, room_id = %room_id, "booking persisted as pending");

        let started = std::time::Instant::now();
        let outcome = match self
            .gateway
            .confirm_availability(room_id, range, &key, Some(booking.id))
            .await
        {
            Ok(confirmation) if confirmation.confirmed => self.finalize(booking).await,
            Ok(confirmation) => {
                // A well-formed reply that still says no is a rejection,
                // not a transport problem: compensate and surface it.
                tracing::warn!(booking_id = %booking.id, message = %confirmation.message, "availability not confirmed, compensating");
                self.compensate(booking).await?;
                Err(BookingError::Conflict(confirmation.message))
            }
            Err(err) => {
                tracing::warn!(booking_id = %booking.id, error = %err, "availability denied, compensating");
                self.compensate(booking).await?;
                Err(err.into())
            }
        };
        metrics::histogram!("booking_saga_duration_seconds").record(started.elapsed().as_secs_f64());
        outcome
    }

    /// Resolves which room the saga targets.
    async fn select_room(
        &self,
        request: &CreateBookingRequest,
        range: DateRange,
    ) -> Result<(RoomId, Option<HotelId>)> {
        if request.auto_select {
            let rooms = self.gateway.recommend(request.hotel_id, Some(range)).await?;
            let Some(room) = rooms.into_iter().next() else {
                return Err(BookingError::Conflict(
                    "No rooms available for the requested dates".to_string(),
                ));
            };
            tracing::info!(room_id = %room.id, times_booked = room.times_booked, "auto-selected room");
            return Ok((room.id, Some(room.hotel_id)));
        }

        let Some(room_id) = request.room_id else {
            return Err(BookingError::Validation(
                "room_id is required unless auto_select is set".to_string(),
            ));
        };

        // Back-fill the hotel id from the inventory side. Best-effort:
        // a failed lookup leaves it unset rather than failing the saga
        // before it starts.
        let hotel_id = match request.hotel_id {
            Some(id) => Some(id),
            None => match self.gateway.get_room(room_id).await {
                Ok(room) => Some(room.hotel_id),
                Err(err) => {
                    tracing::debug!(error = %err, "hotel back-fill lookup failed");
                    None
                }
            },
        };
        Ok((room_id, hotel_id))
    }

    /// Confirms the booking locally, then tells the inventory side to
    /// confirm the lock and bump its popularity counter. The counter
    /// confirmation is best-effort: the booking is already confirmed
    /// and a failure here only skews recommendations.
    async fn finalize(&self, mut booking: Booking) -> Result<Booking> {
        booking.confirm()?;
        let booking = self.store.update(&booking).await?;

        if let Err(err) = self
            .gateway
            .confirm_booking(booking.room_id, &booking.idempotency_key)
            .await
        {
            tracing::warn!(booking_id = %booking.id, error = %err, "counter confirmation failed");
        }

        metrics::counter!("bookings_confirmed_total").increment(1);
        tracing::info!(booking_id = %booking.id, "booking confirmed");
        Ok(booking)
    }

    /// Compensates a failed saga: cancel the local booking, then
    /// release any lock the remote may have taken. The release is
    /// best-effort; an unreleased unconfirmed lock is reclaimed by the
    /// stale-lock purge.
    async fn compensate(&self, mut booking: Booking) -> Result<()> {
        metrics::counter!("bookings_compensated_total").increment(1);

        booking.cancel()?;
        let booking = self.store.update(&booking).await?;

        if let Err(err) = self
            .gateway
            .release(booking.room_id, &booking.idempotency_key, Some(booking.id))
            .await
        {
            tracing::warn!(booking_id = %booking.id, error = %err, "compensating release failed");
        }
        Ok(())
    }

    /// Cancels a booking on behalf of its owner.
    ///
    /// Cancelling an already-cancelled booking is a no-op. The remote
    /// release runs first but never blocks the cancellation: the user's
    /// intent wins even when the inventory side is down.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, booking_id = %booking_id))]
    pub async fn cancel_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking> {
        let mut booking = self
            .store
            .find_by_id_and_user(booking_id, user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))?;

        if booking.status == BookingStatus::Cancelled {
            tracing::info!("booking already cancelled");
            return Ok(booking);
        }

        if let Err(err) = self
            .gateway
            .release(booking.room_id, &booking.idempotency_key, Some(booking.id))
            .await
        {
            tracing::warn!(error = %err, "release failed, cancelling locally anyway");
        }

        booking.cancel()?;
        let booking = self.store.update(&booking).await?;
        metrics::counter!("bookings_cancelled_total").increment(1);
        tracing::info!("booking cancelled");
        Ok(booking)
    }

    /// Fetches a booking owned by the user.
    pub async fn get_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking> {
        self.store
            .find_by_id_and_user(booking_id, user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))
    }

    /// Lists the user's bookings, most recent first.
    pub async fn list_bookings(&self, user_id: UserId) -> Result<Vec<Booking>> {
        Ok(self.store.list_for_user(user_id).await?)
    }
}
