//! Cache-first geocoding.
//!
//! [`CachedGeocoder`] consults the cache before every paid provider call and
//! stores successful payloads afterwards. Cache failures are logged and
//! treated as misses; they never fail the geocoding itself.

use async_trait::async_trait;
use geocache_core::CacheDb;
use serde::Serialize;
use serde_json::Value;

use crate::geocode::{GeocodeError, GeocodeRequest};

/// Anything that can turn a request into a raw provider payload.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, req: &GeocodeRequest) -> Result<Value, GeocodeError>;
}

/// Result of a cache-first geocode.
#[derive(Debug, Clone, Serialize)]
pub struct Geocoded {
    /// Cache key the request normalized to.
    pub cache_key: String,
    /// Raw provider payload.
    pub payload: Value,
    /// Whether the payload came from the cache.
    pub cache_hit: bool,
}

/// Geocoder that answers from the cache when it can.
#[derive(Debug, Clone)]
pub struct CachedGeocoder<G> {
    cache: CacheDb,
    inner: G,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(cache: CacheDb, inner: G) -> Self {
        Self { cache, inner }
    }

    /// The underlying cache handle.
    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    /// Geocode a request, calling the provider only on a cache miss.
    pub async fn geocode(&self, req: &GeocodeRequest) -> Result<Geocoded, GeocodeError> {
        req.validate()?;
        let cache_key = req.cache_key();

        match self.cache.lookup(&cache_key).await {
            Ok(Some(payload)) => {
                tracing::debug!("cache hit for geocode query: {}", cache_key);
                return Ok(Geocoded { cache_key, payload, cache_hit: true });
            }
            Ok(None) => tracing::debug!("cache miss for geocode query: {}", cache_key),
            Err(e) => tracing::warn!("geocode cache lookup failed, treating as miss: {}", e),
        }

        self.fetch_and_store(req, cache_key).await
    }

    /// Geocode a request, bypassing the cache lookup but still storing
    /// the fresh payload.
    pub async fn refresh(&self, req: &GeocodeRequest) -> Result<Geocoded, GeocodeError> {
        req.validate()?;
        let cache_key = req.cache_key();
        self.fetch_and_store(req, cache_key).await
    }

    async fn fetch_and_store(&self, req: &GeocodeRequest, cache_key: String) -> Result<Geocoded, GeocodeError> {
        let payload = self.inner.geocode(req).await?;

        if let Err(e) = self.cache.store(&cache_key, &payload).await {
            tracing::warn!("failed to cache geocode result: {}", e);
        }

        Ok(Geocoded { cache_key, payload, cache_hit: false })
    }
}
