//! Room inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{DateRange, HotelId, RoomId};
use domain::{Hotel, Room};
use gateway::{ConfirmAvailabilityRequest, ConfirmBookingRequest, ReleaseRequest};
use inventory::{Confirmation, ReservationEngine};
use serde::Deserialize;
use store::{RoomLockStore, RoomStore};

use crate::error::ApiError;

/// Shared state for the inventory service handlers.
pub struct InventoryState<S> {
    pub engine: Arc<ReservationEngine<S>>,
}

#[derive(Deserialize)]
pub struct RecommendQuery {
    pub hotel_id: Option<HotelId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct CreateHotelRequest {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub hotel_id: HotelId,
    pub number: String,
}

fn range_from(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<DateRange>, ApiError> {
    match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end)
            .map(Some)
            .map_err(|e| ApiError::BadRequest(e.to_string())),
        (None, None) => Ok(None),
        _ => Err(ApiError::BadRequest(
            "start_date and end_date must be supplied together".to_string(),
        )),
    }
}

/// GET /rooms — lists available rooms, least-booked first.
pub async fn recommend<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let range = range_from(query.start_date, query.end_date)?;
    let rooms = state.engine.recommend(query.hotel_id, range).await?;
    Ok(Json(rooms))
}

/// GET /rooms/{id} — fetches a room.
pub async fn get<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Path(id): Path<RoomId>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.engine.get_room(id).await?))
}

/// POST /hotels — creates a hotel.
#[tracing::instrument(skip(state, req))]
pub async fn create_hotel<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Json(req): Json<CreateHotelRequest>,
) -> Result<(StatusCode, Json<Hotel>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Hotel name must not be empty".to_string()));
    }
    let hotel = state.engine.create_hotel(req.name, req.address).await?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

/// POST /rooms — creates a room in an existing hotel.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    if req.number.trim().is_empty() {
        return Err(ApiError::BadRequest("Room number must not be empty".to_string()));
    }
    let room = state.engine.create_room(req.hotel_id, req.number).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// DELETE /rooms/{id} — deletes a room and its locks.
#[tracing::instrument(skip(state))]
pub async fn delete<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Path(id): Path<RoomId>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_room(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rooms/{id}/confirm-availability — locks the room for a range.
#[tracing::instrument(skip(state, req))]
pub async fn confirm_availability<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Path(id): Path<RoomId>,
    Json(req): Json<ConfirmAvailabilityRequest>,
) -> Result<Json<Confirmation>, ApiError> {
    let range = DateRange::new(req.start_date, req.end_date)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let confirmation = state
        .engine
        .confirm_availability(id, range, req.idempotency_key, req.booking_id)
        .await?;
    Ok(Json(confirmation))
}

/// POST /rooms/{id}/confirm-booking — confirms the lock and bumps the
/// popularity counter.
#[tracing::instrument(skip(state, req))]
pub async fn confirm_booking<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Path(id): Path<RoomId>,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<StatusCode, ApiError> {
    state.engine.confirm_booking(id, req.idempotency_key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rooms/{id}/release — releases the lock for (room, key).
#[tracing::instrument(skip(state, req))]
pub async fn release<S: RoomStore + RoomLockStore>(
    State(state): State<Arc<InventoryState<S>>>,
    Path(id): Path<RoomId>,
    Json(req): Json<ReleaseRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .release_room(id, req.idempotency_key, req.booking_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
