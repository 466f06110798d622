//! Geocoding response types and status handling.
//!
//! The cache stores the provider payload untouched; these types are a
//! typed view for callers that need coordinates out of it.

use serde::Deserialize;
use serde_json::Value;

use super::GeocodeError;

/// Typed view of a provider response.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A single geocoding candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub partial_match: bool,
}

/// Geometry of a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
    #[serde(default)]
    pub location_type: Option<String>,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResponse {
    /// Parse the typed view from a raw payload.
    pub fn from_payload(payload: &Value) -> Result<Self, GeocodeError> {
        serde_json::from_value(payload.clone()).map_err(|e| GeocodeError::Parse(e.to_string()))
    }

    /// Location of the best candidate.
    pub fn first_location(&self) -> Option<LatLng> {
        self.results.first().map(|r| r.geometry.location)
    }

    /// Formatted address of the best candidate.
    pub fn first_address(&self) -> Option<&str> {
        self.results.first().map(|r| r.formatted_address.as_str())
    }
}

/// Check the provider status carried inside a 200 response.
///
/// Only `OK` payloads are returned; everything else becomes an error so
/// that it never reaches the cache.
pub fn check_status(address: &str, payload: Value) -> Result<Value, GeocodeError> {
    let status = payload
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let message = payload
        .get("error_message")
        .and_then(Value::as_str)
        .unwrap_or(&status)
        .to_string();

    match status.as_str() {
        "OK" => Ok(payload),
        "ZERO_RESULTS" => Err(GeocodeError::NotFound(address.to_string())),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(GeocodeError::RateLimited(message)),
        "REQUEST_DENIED" => Err(GeocodeError::AuthError(message)),
        "" => Err(GeocodeError::Parse("response has no status field".to_string())),
        other => Err(GeocodeError::Provider { status: other.to_string(), message }),
    }
}
