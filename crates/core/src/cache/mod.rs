//! SQLite-backed cache for geocoding results.
//!
//! This module provides a persistent key/value cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Exact-match lookup keyed by the normalized query string
//! - Upsert on store (the latest successful fetch wins)
//! - Last-use bookkeeping, usage statistics and age-based pruning
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod migrations;
pub mod prune;
pub mod stats;
pub mod timestamp;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use prune::DEFAULT_MAX_AGE_DAYS;
pub use stats::{CacheStats, RECENT_WINDOW_DAYS};
