//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound for day-count settings (100 years).
pub const MAX_DAYS: u32 = 36_500;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `db_path` is empty
    /// - `geocode_base_url` is not an http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `min_request_interval_ms` exceeds one minute
    /// - `prune_max_age_days` or `recent_window_days` is 0 or above `MAX_DAYS`
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        if !(self.geocode_base_url.starts_with("http://") || self.geocode_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "geocode_base_url".into(),
                reason: "must be an http or https URL".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.min_request_interval_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "min_request_interval_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.prune_max_age_days == 0 {
            return Err(ConfigError::Invalid {
                field: "prune_max_age_days".into(),
                reason: "must be at least 1 day".into(),
            });
        }

        if self.prune_max_age_days > MAX_DAYS {
            return Err(ConfigError::Invalid {
                field: "prune_max_age_days".into(),
                reason: format!("must not exceed {MAX_DAYS} days"),
            });
        }

        if self.recent_window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "recent_window_days".into(),
                reason: "must be at least 1 day".into(),
            });
        }

        if self.recent_window_days > MAX_DAYS {
            return Err(ConfigError::Invalid {
                field: "recent_window_days".into(),
                reason: format!("must not exceed {MAX_DAYS} days"),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.recent_window_days > self.prune_max_age_days {
            tracing::warn!(
                recent_window_days = self.recent_window_days,
                prune_max_age_days = self.prune_max_age_days,
                "recency window is longer than the prune threshold; \
                 pruned entries would have counted as recent"
            );
        }

        Ok(())
    }
}
