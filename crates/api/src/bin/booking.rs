//! Booking service entry point.

use std::sync::Arc;

use api::config::Config;
use api::{BookingState, create_booking_app, shutdown_signal};
use booking::BookingOrchestrator;
use gateway::{HttpInventoryClient, InventoryClient, ResilientGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{BookingStore, MemoryBookingStore, PostgresBookingStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn run<B, C>(store: B, gateway: ResilientGateway<C>, config: Config, metrics: PrometheusHandle)
where
    B: BookingStore + 'static,
    C: InventoryClient + 'static,
{
    let state = Arc::new(BookingState {
        orchestrator: BookingOrchestrator::new(store, gateway),
        unavailable_as_conflict: config.unavailable_as_conflict,
    });
    let app = create_booking_app(state, metrics);

    let addr = config.addr();
    tracing::info!(%addr, "starting booking service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let client = HttpInventoryClient::new(config.inventory_url.clone())
        .expect("failed to build inventory client");
    let gateway = ResilientGateway::with_defaults(client);

    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresBookingStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            run(store, gateway, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory booking store");
            run(MemoryBookingStore::new(), gateway, config, metrics_handle).await;
        }
    }
}
