//! Liveness endpoint served by both the booking and inventory binaries.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health. Reports that the server is up; it says nothing about
/// the database or the peer authority being reachable.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
