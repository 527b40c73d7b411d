//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server and job configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default: `"0.0.0.0"`, `8082`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL DSN; in-memory storage when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `DISPATCH_INTERVAL_MS`, `MOVE_INTERVAL_MS`, `RELAY_INTERVAL_MS`: job cadences
/// - `JOB_TIMEOUT_MS`: deadline for a single job tick (default: `5000`)
/// - `RELAY_BATCH_SIZE`: outbox rows per relay poll (default: `100`)
/// - `ORDER_EVENTS_TOPIC`: bus topic for order events (default: `"order.changed"`)
/// - `GEO_TIMEOUT_MS`: bound on the geolocation call (default: `1000`)
/// - `KAFKA_BROKERS`: brokers for the Kafka publisher
///
/// Values that fail to parse fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub dispatch_interval: Duration,
    pub move_interval: Duration,
    pub relay_interval: Duration,
    pub job_timeout: Duration,
    pub relay_batch_size: usize,
    pub order_events_topic: String,
    pub geo_timeout: Duration,
    pub kafka_brokers: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            dispatch_interval: millis("DISPATCH_INTERVAL_MS", defaults.dispatch_interval),
            move_interval: millis("MOVE_INTERVAL_MS", defaults.move_interval),
            relay_interval: millis("RELAY_INTERVAL_MS", defaults.relay_interval),
            job_timeout: millis("JOB_TIMEOUT_MS", defaults.job_timeout),
            relay_batch_size: lookup("RELAY_BATCH_SIZE")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.relay_batch_size),
            order_events_topic: lookup("ORDER_EVENTS_TOPIC").unwrap_or(defaults.order_events_topic),
            geo_timeout: millis("GEO_TIMEOUT_MS", defaults.geo_timeout),
            kafka_brokers: lookup("KAFKA_BROKERS").filter(|b| !b.is_empty()),
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
            port: 8082,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 10,
            dispatch_interval: Duration::from_millis(1000),
            move_interval: Duration::from_millis(2000),
            relay_interval: Duration::from_millis(1000),
            job_timeout: Duration::from_millis(5000),
            relay_batch_size: outbox::DEFAULT_BATCH_SIZE,
            order_events_topic: "order.changed".to_string(),
            geo_timeout: application::DEFAULT_GEO_TIMEOUT,
            kafka_brokers: None,
        }
    }
}
