//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; in-memory stores
///   when unset
/// - `INVENTORY_URL` — base URL of the inventory service (default:
///   `"http://localhost:3001"`)
/// - `UNAVAILABLE_AS_CONFLICT` — report inventory outages as `409`
///   instead of `503` (default: `true`)
/// - `LOCK_TTL_SECS` — age after which unconfirmed locks are purged
///   (default: `3600`)
/// - `LOCK_PURGE_INTERVAL_SECS` — how often the purge runs (default:
///   `300`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub inventory_url: String,
    pub unavailable_as_conflict: bool,
    pub lock_ttl: Duration,
    pub lock_purge_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            inventory_url: std::env::var("INVENTORY_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            unavailable_as_conflict: std::env::var("UNAVAILABLE_AS_CONFLICT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            lock_ttl: Duration::from_secs(
                std::env::var("LOCK_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),
            lock_purge_interval: Duration::from_secs(
                std::env::var("LOCK_PURGE_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            inventory_url: "http://localhost:3001".to_string(),
            unavailable_as_conflict: true,
            lock_ttl: Duration::from_secs(3600),
            lock_purge_interval: Duration::from_secs(300),
        }
    }
}
