//! Cache usage statistics.

use super::connection::CacheDb;
use super::timestamp;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_rusqlite::params;

/// Trailing window, in days, that counts an entry as recently used.
pub const RECENT_WINDOW_DAYS: u32 = 7;

/// Summary of cache contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached queries.
    pub total: u64,
    /// Entries used within the recency window.
    pub recently_used: u64,
    /// `recently_used / total` as a rounded percentage; 0 for an empty cache.
    pub recent_usage_percent: u32,
    /// Earliest `created_at` across all entries.
    pub oldest_entry: Option<DateTime<Utc>>,
}

impl CacheStats {
    fn new(total: u64, recently_used: u64, oldest_entry: Option<DateTime<Utc>>) -> Self {
        Self { total, recently_used, recent_usage_percent: usage_percent(recently_used, total), oldest_entry }
    }
}

fn usage_percent(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total entries:    {}", self.total)?;
        writeln!(f, "recently used:    {} ({}%)", self.recently_used, self.recent_usage_percent)?;
        match self.oldest_entry {
            Some(oldest) => write!(f, "oldest entry:     {}", timestamp::format(oldest)),
            None => write!(f, "oldest entry:     -"),
        }
    }
}

impl CacheDb {
    /// Compute statistics using the default 7-day recency window.
    pub async fn statistics(&self) -> Result<CacheStats, Error> {
        self.statistics_at(timestamp::now(), RECENT_WINDOW_DAYS).await
    }

    /// Compute statistics with a custom recency window.
    pub async fn statistics_with_window(&self, window_days: u32) -> Result<CacheStats, Error> {
        self.statistics_at(timestamp::now(), window_days).await
    }

    /// Compute statistics relative to an explicit clock reading.
    pub async fn statistics_at(&self, now: DateTime<Utc>, window_days: u32) -> Result<CacheStats, Error> {
        let since = timestamp::format(timestamp::days_before(now, window_days));

        let (total, recent, oldest) = self
            .conn
            .call(move |conn| -> Result<(i64, i64, Option<String>), Error> {
                let row = conn.query_row(
                    "SELECT
                        COUNT(*),
                        COALESCE(SUM(CASE WHEN last_used_at >= ?1 THEN 1 ELSE 0 END), 0),
                        MIN(created_at)
                    FROM geocode_cache",
                    params![since],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        let oldest = oldest.as_deref().map(timestamp::parse).transpose()?;
        Ok(CacheStats::new(total as u64, recent as u64, oldest))
    }
}
