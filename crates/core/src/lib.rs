//! Core types and shared functionality for geocache.
//!
//! This crate provides:
//! - Geocode result cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, CacheStats};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
