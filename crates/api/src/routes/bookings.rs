//! Booking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use booking::{BookingOrchestrator, CreateBookingRequest};
use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, HotelId, RoomId, UserId};
use domain::Booking;
use gateway::InventoryClient;
use serde::Serialize;
use store::BookingStore;

use crate::error::ApiError;

/// Shared state for the booking service handlers.
pub struct BookingState<B: BookingStore, C: InventoryClient> {
    pub orchestrator: BookingOrchestrator<B, C>,
    /// Fold inventory outages into `409` instead of `503`.
    pub unavailable_as_conflict: bool,
}

impl<B: BookingStore, C: InventoryClient> BookingState<B, C> {
    fn map_err(&self, err: booking::BookingError) -> ApiError {
        ApiError::from_booking(err, self.unavailable_as_conflict)
    }
}

/// Resolves the caller's identity from the `x-user-id` header.
fn user_id(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))?;
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid x-user-id: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub hotel_id: Option<HotelId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            room_id: b.room_id,
            hotel_id: b.hotel_id,
            start_date: b.range.start,
            end_date: b.range.end,
            status: b.status.to_string(),
            idempotency_key: b.idempotency_key.as_str().to_string(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub id: BookingId,
    pub status: String,
}

/// POST /bookings — runs the booking saga.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<B: BookingStore, C: InventoryClient>(
    State(state): State<Arc<BookingState<B, C>>>,
    headers: HeaderMap,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let user = user_id(&headers)?;
    let booking = state
        .orchestrator
        .create_booking(user, req)
        .await
        .map_err(|e| state.map_err(e))?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /bookings — lists the caller's bookings, most recent first.
pub async fn list<B: BookingStore, C: InventoryClient>(
    State(state): State<Arc<BookingState<B, C>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let user = user_id(&headers)?;
    let bookings = state
        .orchestrator
        .list_bookings(user)
        .await
        .map_err(|e| state.map_err(e))?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// GET /bookings/{id} — fetches one of the caller's bookings.
pub async fn get<B: BookingStore, C: InventoryClient>(
    State(state): State<Arc<BookingState<B, C>>>,
    headers: HeaderMap,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = user_id(&headers)?;
    let booking = state
        .orchestrator
        .get_booking(user, id)
        .await
        .map_err(|e| state.map_err(e))?;
    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/cancel — cancels a booking and releases its room.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<B: BookingStore, C: InventoryClient>(
    State(state): State<Arc<BookingState<B, C>>>,
    headers: HeaderMap,
    Path(id): Path<BookingId>,
) -> Result<Json<CancelResponse>, ApiError> {
    let user = user_id(&headers)?;
    let booking = state
        .orchestrator
        .cancel_booking(user, id)
        .await
        .map_err(|e| state.map_err(e))?;
    Ok(Json(CancelResponse {
        id: booking.id,
        status: booking.status.to_string(),
    }))
}
