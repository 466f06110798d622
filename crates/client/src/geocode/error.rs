//! Geocoding client error types.

use std::sync::Arc;

/// Errors from the geocoding provider client.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// No API key configured.
    #[error("missing API key: GEOCACHE_GEOCODE_API_KEY not set")]
    MissingApiKey,

    /// Invalid geocoding request.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid base URL.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// Authentication failed or the key is not allowed to call the API.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Rate or quota limit reached.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider found nothing for the address.
    #[error("no results for query: {0}")]
    NotFound(String),

    /// The provider answered with a non-OK status.
    #[error("provider error {status}: {message}")]
    Provider { status: String, message: String },

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { GeocodeError::Timeout } else { GeocodeError::Network(Arc::new(err)) }
    }
}
