// --- File: crates/booking_config/src/models.rs ---

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for one request, store calls included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/booking.db, or "secret_from_env" to read DATABASE_URL
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA zone the business operates in; booking logs show local wall times in it.
    #[serde(default = "default_operating_time_zone")]
    pub operating_time_zone: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            operating_time_zone: default_operating_time_zone(),
        }
    }
}

impl BookingConfig {
    /// The parsed operating zone; unknown names fall back to UTC.
    pub fn time_zone(&self) -> Tz {
        Tz::from_str(&self.operating_time_zone).unwrap_or(Tz::UTC)
    }
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    /// Use the SQL store instead of the in-memory one.
    #[serde(default)]
    pub use_database: bool,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_operating_time_zone() -> String {
    "America/Argentina/Buenos_Aires".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
