//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingError;
use inventory::InventoryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Overlapping dates, duplicate keys, or no rooms to book.
    Conflict(String),
    /// A downstream dependency could not be reached.
    Unavailable(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl ApiError {
    /// Maps an orchestrator error, optionally folding `Unavailable`
    /// into `Conflict` for clients that treat any failed booking the
    /// same way.
    pub fn from_booking(err: BookingError, unavailable_as_conflict: bool) -> Self {
        match err {
            BookingError::Validation(msg) => ApiError::BadRequest(msg),
            BookingError::NotFound(msg) => ApiError::NotFound(msg),
            BookingError::Conflict(msg) => ApiError::Conflict(msg),
            BookingError::Unavailable(msg) if unavailable_as_conflict => {
                ApiError::Conflict(format!("Booking could not be completed: {msg}"))
            }
            BookingError::Unavailable(msg) => ApiError::Unavailable(msg),
            BookingError::Store(e) => ApiError::Internal(e.to_string()),
            BookingError::Domain(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Validation(msg) => ApiError::BadRequest(msg),
            InventoryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            InventoryError::Conflict(msg) => ApiError::Conflict(msg),
            InventoryError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
