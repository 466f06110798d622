//! Age-based pruning of unused entries.
//!
//! Staleness is judged by last use, so a frequently hit entry survives
//! regardless of when it was created.

use super::connection::CacheDb;
use super::timestamp;
use crate::Error;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;

/// Default age threshold, in days, for [`CacheDb::prune`].
pub const DEFAULT_MAX_AGE_DAYS: u32 = 90;

impl CacheDb {
    /// Delete entries not used within the last `max_age_days` days.
    ///
    /// Returns the number of deleted entries.
    pub async fn prune(&self, max_age_days: u32) -> Result<u64, Error> {
        self.prune_at(timestamp::now(), max_age_days).await
    }

    /// Like [`CacheDb::prune`], with an explicit clock reading.
    pub async fn prune_at(&self, now: DateTime<Utc>, max_age_days: u32) -> Result<u64, Error> {
        let cutoff = timestamp::format(timestamp::days_before(now, max_age_days));
        let deleted = self
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM geocode_cache WHERE last_used_at < ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(deleted, max_age_days, "pruned stale geocode cache entries");
        Ok(deleted)
    }
}
