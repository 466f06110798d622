//! Lookup and store operations for cached geocode results.
//!
//! Keys are matched exactly; callers normalize queries before reaching
//! this layer. Results are stored opaquely as JSON text.

use super::connection::CacheDb;
use super::timestamp;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached geocoding result with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query: String,
    pub result: Value,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

impl CacheDb {
    /// Get the cached result for a query, refreshing its last-used time.
    ///
    /// Returns None on a miss or for an empty query.
    pub async fn lookup(&self, query: &str) -> Result<Option<Value>, Error> {
        self.lookup_at(query, timestamp::now()).await
    }

    /// Like [`CacheDb::lookup`], with an explicit clock reading.
    pub async fn lookup_at(&self, query: &str, now: DateTime<Utc>) -> Result<Option<Value>, Error> {
        if is_blank(query) {
            tracing::debug!("skipping cache lookup for empty query");
            return Ok(None);
        }

        let query = query.to_string();
        let now = timestamp::format(now);
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let tx = conn.transaction()?;
                let touched = tx.execute(
                    "UPDATE geocode_cache SET last_used_at = MAX(last_used_at, ?2) WHERE query = ?1",
                    params![query, now],
                )?;
                if touched == 0 {
                    return Ok(None);
                }

                let result: String =
                    tx.query_row("SELECT result FROM geocode_cache WHERE query = ?1", params![query], |row| {
                        row.get(0)
                    })?;
                tx.commit()?;
                Ok(Some(result))
            })
            .await
            .map_err(Error::from)?;

        raw.map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    /// Insert or update the cached result for a query.
    ///
    /// Uses UPSERT semantics: a new query gets `created_at = last_used_at = now`;
    /// an existing one has its result replaced and `last_used_at` advanced while
    /// `created_at` is kept. Returns false without writing for an empty query.
    pub async fn store(&self, query: &str, result: &Value) -> Result<bool, Error> {
        self.store_at(query, result, timestamp::now()).await
    }

    /// Like [`CacheDb::store`], with an explicit clock reading.
    pub async fn store_at(&self, query: &str, result: &Value, now: DateTime<Utc>) -> Result<bool, Error> {
        if is_blank(query) {
            tracing::debug!("skipping cache store for empty query");
            return Ok(false);
        }

        let query = query.to_string();
        let result_json = serde_json::to_string(result)?;
        let now = timestamp::format(now);

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                conn.execute(
                    "INSERT INTO geocode_cache (query, result, created_at, last_used_at)
                    VALUES (?1, ?2, ?3, ?3)
                    ON CONFLICT(query) DO UPDATE SET
                        result = excluded.result,
                        last_used_at = MAX(geocode_cache.last_used_at, excluded.last_used_at)",
                    params![query, result_json, now],
                )?;
                Ok(true)
            })
            .await
            .map_err(Error::from)
    }

    /// Read an entry with its timestamps without counting it as a use.
    pub async fn get_entry(&self, query: &str) -> Result<Option<CacheEntry>, Error> {
        let query = query.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, String, String, String)>, Error> {
                let result = conn.query_row(
                    "SELECT query, result, created_at, last_used_at FROM geocode_cache WHERE query = ?1",
                    params![query],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((query, result, created_at, last_used_at)) = row else {
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            query,
            result: serde_json::from_str(&result)?,
            created_at: timestamp::parse(&created_at)?,
            last_used_at: timestamp::parse(&last_used_at)?,
        }))
    }

    /// Delete a single entry.
    ///
    /// Returns true if an entry was removed.
    pub async fn remove(&self, query: &str) -> Result<bool, Error> {
        let query = query.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM geocode_cache WHERE query = ?1", params![query])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_result(lat: f64, lng: f64) -> Value {
        json!({
            "status": "OK",
            "results": [{
                "formatted_address": "123 Main St, Springfield, IL 62701, USA",
                "geometry": { "location": { "lat": lat, "lng": lng } }
            }]
        })
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.lookup("123 main st, springfield, il").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_store_and_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let query = "123 main st, springfield, il";
        let result = sample_result(39.78, -89.65);

        assert!(db.store(query, &result).await.unwrap());
        let before = db.get_entry(query).await.unwrap().unwrap().last_used_at;

        let retrieved = db.lookup(query).await.unwrap().unwrap();
        assert_eq!(retrieved, result);

        let after = db.get_entry(query).await.unwrap().unwrap().last_used_at;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn test_new_entry_timestamps_equal() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store_at("a", &json!({}), base_time()).await.unwrap();

        let entry = db.get_entry("a").await.unwrap().unwrap();
        assert_eq!(entry.created_at, base_time());
        assert_eq!(entry.last_used_at, entry.created_at);
    }

    #[tokio::test]
    async fn test_lookup_refreshes_last_used() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store_at("a", &json!({"n": 1}), base_time()).await.unwrap();

        let later = base_time() + Duration::days(3);
        assert!(db.lookup_at("a", later).await.unwrap().is_some());

        let entry = db.get_entry("a").await.unwrap().unwrap();
        assert_eq!(entry.created_at, base_time());
        assert_eq!(entry.last_used_at, later);
    }

    #[tokio::test]
    async fn test_lookup_never_moves_last_used_back() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store_at("a", &json!({}), base_time()).await.unwrap();
        db.lookup_at("a", base_time() - Duration::hours(1)).await.unwrap();

        let entry = db.get_entry("a").await.unwrap().unwrap();
        assert_eq!(entry.last_used_at, base_time());
    }

    #[tokio::test]
    async fn test_store_twice_single_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = sample_result(1.0, 2.0);
        db.store("dup", &result).await.unwrap();
        db.store("dup", &result).await.unwrap();

        let count: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM geocode_cache WHERE query = 'dup'", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.lookup("dup").await.unwrap().unwrap(), result);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_and_keeps_created_at() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = sample_result(1.0, 1.0);
        let second = sample_result(2.0, 2.0);

        db.store_at("key", &first, base_time()).await.unwrap();
        let later = base_time() + Duration::minutes(5);
        db.store_at("key", &second, later).await.unwrap();

        let entry = db.get_entry("key").await.unwrap().unwrap();
        assert_eq!(entry.result, second);
        assert_eq!(entry.created_at, base_time());
        assert_eq!(entry.last_used_at, later);

        let retrieved = db.lookup_at("key", later + Duration::minutes(1)).await.unwrap().unwrap();
        assert_eq!(retrieved, second);
    }

    #[tokio::test]
    async fn test_exact_match_only() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store("main st", &json!({})).await.unwrap();

        assert!(db.lookup("Main St").await.unwrap().is_none());
        assert!(db.lookup("main st ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_query_is_noop() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.store("", &json!({})).await.unwrap());
        assert!(!db.store("   ", &json!({})).await.unwrap());
        assert!(db.lookup("").await.unwrap().is_none());
        assert!(db.get_entry("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.store("gone", &json!({})).await.unwrap();

        assert!(db.remove("gone").await.unwrap());
        assert!(!db.remove("gone").await.unwrap());
        assert!(db.lookup("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_result_is_error() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.conn
            .call(|conn| conn.execute("INSERT INTO geocode_cache (query, result) VALUES ('bad', 'not json')", []))
            .await
            .unwrap();

        let result = db.lookup("bad").await;
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_concurrent_stores_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.sqlite");
        let first = CacheDb::open(&path).await.unwrap();
        let second = CacheDb::open(&path).await.unwrap();

        let a = json!({"writer": "a"});
        let b = json!({"writer": "b"});
        let (ra, rb) = tokio::join!(first.store("shared", &a), second.store("shared", &b));
        assert!(ra.unwrap());
        assert!(rb.unwrap());

        let stored = first.get_entry("shared").await.unwrap().unwrap().result;
        assert!(stored == a || stored == b);
        assert_eq!(first.statistics().await.unwrap().total, 1);

        // Once ordered, the later commit wins regardless of which handle made it.
        first.store("shared", &a).await.unwrap();
        second.store("shared", &b).await.unwrap();
        assert_eq!(first.lookup("shared").await.unwrap().unwrap(), b);

        first.store("shared", &a).await.unwrap();
        assert_eq!(second.lookup("shared").await.unwrap().unwrap(), a);
        assert_eq!(second.statistics().await.unwrap().total, 1);

        first.close().await.unwrap();
        second.close().await.unwrap();
    }
}
