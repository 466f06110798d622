//! Client code for geocache.
//!
//! This crate provides the geocoding provider client, query normalization
//! and the cache-first geocoder used by batch jobs and the CLI.

pub mod geocode;
pub mod geocoder;
pub mod normalize;

pub use geocode::{
    GeocodeClient, GeocodeConfig, GeocodeError, GeocodeRequest, GeocodeResponse, GeocodeResult, LatLng,
};
pub use geocoder::{CachedGeocoder, Geocoded, Geocoder};
pub use normalize::normalize_query;
