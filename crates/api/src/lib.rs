//! HTTP servers with observability for both authorities.
//!
//! Two routers are assembled here: the booking service (the saga
//! orchestrator behind `/bookings`) and the inventory service (the
//! reservation engine behind `/rooms`). Both carry structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use gateway::InventoryClient;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{BookingStore, RoomLockStore, RoomStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::bookings::BookingState;
pub use routes::rooms::InventoryState;

fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(handle)
}

/// Creates the booking service router with all routes and shared state.
pub fn create_booking_app<B, C>(
    state: Arc<BookingState<B, C>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    B: BookingStore + 'static,
    C: InventoryClient + 'static,
{
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bookings", post(routes::bookings::create::<B, C>))
        .route("/bookings", get(routes::bookings::list::<B, C>))
        .route("/bookings/{id}", get(routes::bookings::get::<B, C>))
        .route("/bookings/{id}/cancel", post(routes::bookings::cancel::<B, C>))
        .with_state(state)
        .merge(metrics_router(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the inventory service router with all routes and shared state.
pub fn create_inventory_app<S>(
    state: Arc<InventoryState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: RoomStore + RoomLockStore + 'static,
{
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/hotels", post(routes::rooms::create_hotel::<S>))
        .route("/rooms", get(routes::rooms::recommend::<S>))
        .route("/rooms", post(routes::rooms::create::<S>))
        .route("/rooms/{id}", get(routes::rooms::get::<S>))
        .route("/rooms/{id}", delete(routes::rooms::delete::<S>))
        .route(
            "/rooms/{id}/confirm-availability",
            post(routes::rooms::confirm_availability::<S>),
        )
        .route(
            "/rooms/{id}/confirm-booking",
            post(routes::rooms::confirm_booking::<S>),
        )
        .route("/rooms/{id}/release", post(routes::rooms::release::<S>))
        .with_state(state)
        .merge(metrics_router(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
