//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `CART_SERVICE_URL`: cart service base URL (unset: in-memory carts)
/// - `PAYMENT_SERVICE_URL`: payment endpoint base URL (unset: in-process)
/// - `DATABASE_URL`: PostgreSQL URL (unset: in-memory stores)
/// - `CART_TIMEOUT_MS` (default: `5000`)
/// - `PAYMENT_TIMEOUT_MS` (default: `10000`)
/// - `GATEWAY_TIMEOUT_MS` (default: `5000`)
/// - `EVENT_PARTITIONS` (default: `8`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub cart_service_url: Option<String>,
    pub payment_service_url: Option<String>,
    pub database_url: Option<String>,
    pub cart_timeout: Duration,
    pub payment_timeout: Duration,
    pub gateway_timeout: Duration,
    pub event_partitions: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults; blank URLs count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };
        let url = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            cart_service_url: url("CART_SERVICE_URL"),
            payment_service_url: url("PAYMENT_SERVICE_URL"),
            database_url: url("DATABASE_URL"),
            cart_timeout: millis("CART_TIMEOUT_MS", defaults.cart_timeout),
            payment_timeout: millis("PAYMENT_TIMEOUT_MS", defaults.payment_timeout),
            gateway_timeout: millis("GATEWAY_TIMEOUT_MS", defaults.gateway_timeout),
            event_partitions: lookup("EVENT_PARTITIONS")
                .and_then(|p| p.parse().ok())
                .filter(|p| *p > 0)
                .unwrap_or(defaults.event_partitions),
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
            log_format: LogFormat::Text,
            cart_service_url: None,
            payment_service_url: None,
            database_url: None,
            cart_timeout: Duration::from_millis(5000),
            payment_timeout: Duration::from_millis(10_000),
            gateway_timeout: Duration::from_millis(5000),
            event_partitions: event_channel::DEFAULT_PARTITIONS,
        }
    }
}
