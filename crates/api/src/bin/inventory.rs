//! Inventory service entry point.

use std::sync::Arc;

use api::config::Config;
use api::{InventoryState, create_inventory_app, shutdown_signal};
use inventory::ReservationEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryInventoryStore, PostgresInventoryStore, RoomLockStore, RoomStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn run<S>(store: S, config: Config, metrics: PrometheusHandle)
where
    S: RoomStore + RoomLockStore + 'static,
{
    let engine = Arc::new(ReservationEngine::new(store));

    let ttl = chrono::Duration::from_std(config.lock_ttl).expect("lock TTL out of range");
    let purge_engine = engine.clone();
    let purge_interval = config.lock_purge_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            if let Err(err) = purge_engine.purge_stale_locks(ttl).await {
                tracing::error!(error = %err, "stale lock purge failed");
            }
        }
    });

    let state = Arc::new(InventoryState { engine });
    let app = create_inventory_app(state, metrics);

    let addr = config.addr();
    tracing::info!(%addr, "starting inventory service");

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

    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresInventoryStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            run(store, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory inventory store");
            run(MemoryInventoryStore::new(), config, metrics_handle).await;
        }
    }
}
