//! Command implementations.
//!
//! Cache failures here are logged and reported as empty results; only
//! provider failures and output errors reach the exit status.

use std::io::Write;

use anyhow::Result;
use geocache_client::{CachedGeocoder, GeocodeClient, GeocodeRequest, normalize_query};
use geocache_core::{AppConfig, CacheDb, CacheStats};
use serde_json::Value;

/// Outcome of the default report command.
#[derive(Debug, Default)]
pub struct Report {
    pub stats: CacheStats,
    pub pruned: Option<u64>,
}

/// Print statistics and, when asked, prune entries unused for `prune_days`.
pub async fn report(db: &CacheDb, window_days: u32, prune_days: Option<u32>, out: &mut impl Write) -> Result<Report> {
    if let Err(e) = db.ensure_storage_ready().await {
        tracing::warn!("cache storage setup failed: {}", e);
    }

    let stats = db.statistics_with_window(window_days).await.unwrap_or_else(|e| {
        tracing::warn!("failed to read cache statistics: {}", e);
        CacheStats::default()
    });
    writeln!(out, "{stats}")?;

    let pruned = match prune_days {
        Some(days) => {
            let removed = db.prune(days).await.unwrap_or_else(|e| {
                tracing::warn!("failed to prune cache: {}", e);
                0
            });
            writeln!(out, "pruned:           {removed} (unused for {days}+ days)")?;
            Some(removed)
        }
        None => None,
    };

    Ok(Report { stats, pruned })
}

/// Print the cached payload for an address. Returns it when present.
pub async fn lookup(db: &CacheDb, address: &str, out: &mut impl Write) -> Result<Option<Value>> {
    let key = normalize_query(address);
    let payload = db.lookup(&key).await.unwrap_or_else(|e| {
        tracing::warn!("cache lookup failed, treating as miss: {}", e);
        None
    });

    match &payload {
        Some(value) => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        None => tracing::info!("no cached result for {:?}", key),
    }

    Ok(payload)
}

/// Geocode through the cache and print the result.
pub async fn geocode(
    db: &CacheDb, config: &AppConfig, req: &GeocodeRequest, refresh: bool, out: &mut impl Write,
) -> Result<()> {
    let client = GeocodeClient::from_app_config(config)?;
    let geocoder = CachedGeocoder::new(db.clone(), client);

    let geocoded = if refresh { geocoder.refresh(req).await? } else { geocoder.geocode(req).await? };
    tracing::info!(cache_hit = geocoded.cache_hit, "geocoded {:?}", geocoded.cache_key);

    writeln!(out, "{}", serde_json::to_string_pretty(&geocoded)?)?;
    Ok(())
}
