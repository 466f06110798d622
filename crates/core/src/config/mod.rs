//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GEOCACHE_*)
//! 2. TOML config file (if GEOCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_MAX_AGE_DAYS, RECENT_WINDOW_DAYS};

mod validation;

pub use validation::{ConfigError, MAX_DAYS};

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GEOCACHE_*)
/// 2. TOML config file (if GEOCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via GEOCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Geocoding provider API key.
    ///
    /// Set via GEOCACHE_GEOCODE_API_KEY environment variable.
    /// Required only when a live geocode request is made.
    #[serde(default)]
    pub geocode_api_key: Option<String>,

    /// Base URL of the geocoding provider.
    ///
    /// Set via GEOCACHE_GEOCODE_BASE_URL environment variable.
    #[serde(default = "default_geocode_base_url")]
    pub geocode_base_url: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Minimum delay between provider requests, in milliseconds.
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Entries unused for longer than this many days are pruned.
    #[serde(default = "default_prune_max_age_days")]
    pub prune_max_age_days: u32,

    /// Trailing window, in days, that counts an entry as recently used.
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./geocache.sqlite")
}

fn default_geocode_base_url() -> String {
    "https://maps.googleapis.com/maps/api".into()
}

fn default_user_agent() -> String {
    "geocache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_min_request_interval_ms() -> u64 {
    200
}

fn default_prune_max_age_days() -> u32 {
    DEFAULT_MAX_AGE_DAYS
}

fn default_recent_window_days() -> u32 {
    RECENT_WINDOW_DAYS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            geocode_api_key: None,
            geocode_base_url: default_geocode_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
            prune_max_age_days: default_prune_max_age_days(),
            recent_window_days: default_recent_window_days(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Provider pacing interval as Duration.
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `GEOCACHE_`
    /// 2. TOML file from `GEOCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GEOCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GEOCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the geocoding API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_geocode_api_key(&self) -> Result<&str, ConfigError> {
        self.geocode_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "geocode_api_key".into(),
                hint: "Set GEOCACHE_GEOCODE_API_KEY environment variable".into(),
            })
    }
}
