//! Geocoding provider client.
//!
//! Calls a Google Geocoding-compatible API and returns the raw JSON
//! payload so it can be cached opaquely.
//!
//! ### Provider contract
//!
//! - **Endpoint**: `{base_url}/geocode/json?address=..&key=..`
//! - **Authentication**: API key as the `key` query parameter.
//! - **Pacing**: a fixed minimum interval between requests, enforced by
//!   sleeping before each call.
//! - **Status**: only `OK` payloads are returned; `ZERO_RESULTS`, quota and
//!   denial statuses become errors.

pub mod error;
pub mod request;
pub mod response;

pub use error::GeocodeError;
pub use request::GeocodeRequest;
pub use response::{GeocodeResponse, GeocodeResult, Geometry, LatLng};

use async_trait::async_trait;
use geocache_core::AppConfig;
use reqwest::header;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use crate::Geocoder;

/// Default base URL for the geocoding API.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "geocache/0.1";

/// Default minimum interval between requests.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// Geocoding client configuration.
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Provider API key.
    pub api_key: String,
    /// Base URL (default: https://maps.googleapis.com/maps/api).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: geocache/0.x).
    pub user_agent: String,
    /// Minimum spacing between requests (default: 200ms).
    pub min_interval: Duration,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl GeocodeConfig {
    /// Build the client configuration from the application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        let api_key = config
            .require_geocode_api_key()
            .map_err(|_| GeocodeError::MissingApiKey)?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: config.geocode_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            min_interval: config.min_request_interval(),
        })
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Geocoding API client.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    endpoint: Url,
    config: GeocodeConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl GeocodeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GeocodeConfig) -> Result<Self, GeocodeError> {
        if config.api_key.is_empty() {
            return Err(GeocodeError::MissingApiKey);
        }

        let endpoint = Url::parse(&format!("{}/geocode/json", config.base_url.trim_end_matches('/')))
            .map_err(|e| GeocodeError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Network(Arc::new(e)))?;

        let rate_limiter = Arc::new(RateLimiter::new(config.min_interval));
        Ok(Self { http, endpoint, config, rate_limiter })
    }

    /// Create a client from the application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        Self::new(GeocodeConfig::from_app_config(config)?)
    }

    /// Geocode an address, returning the provider's raw payload.
    ///
    /// This method handles pacing, request validation and status checks.
    pub async fn geocode(&self, req: &GeocodeRequest) -> Result<Value, GeocodeError> {
        req.validate()?;

        self.rate_limiter.acquire().await;

        let start = Instant::now();
        tracing::debug!("geocoding address: {}", req.address);

        let http_response = self
            .http
            .get(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .query(req)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("geocoding response status: {}", status);

        if status == 401 || status == 403 {
            return Err(GeocodeError::AuthError(format!("HTTP {}", status.as_u16())));
        }

        if status == 429 {
            return Err(GeocodeError::RateLimited(format!("HTTP {}", status.as_u16())));
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(GeocodeError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let payload = response::check_status(&req.address, payload)?;
        tracing::debug!("geocode completed in {:?}", start.elapsed());

        Ok(payload)
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn geocode(&self, req: &GeocodeRequest) -> Result<Value, GeocodeError> {
        GeocodeClient::geocode(self, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeocodeClient {
        GeocodeClient::new(GeocodeConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            min_interval: Duration::ZERO,
            ..Default::default()
        })
        .unwrap()
    }

    fn ok_payload() -> Value {
        json!({
            "results": [{
                "formatted_address": "1 Infinite Loop, Cupertino, CA 95014, USA",
                "geometry": { "location": { "lat": 37.3318, "lng": -122.0312 } }
            }],
            "status": "OK"
        })
    }

    #[test]
    fn test_client_new_missing_key() {
        let result = GeocodeClient::new(GeocodeConfig::default());
        assert!(matches!(result, Err(GeocodeError::MissingApiKey)));
    }

    #[test]
    fn test_client_new_invalid_base_url() {
        let config = GeocodeConfig { api_key: "k".into(), base_url: "not a url".into(), ..Default::default() };
        assert!(matches!(GeocodeClient::new(config), Err(GeocodeError::InvalidUrl(_))));
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig { geocode_api_key: Some("abc".into()), ..Default::default() };
        let config = GeocodeConfig::from_app_config(&app).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.min_interval, Duration::from_millis(200));

        let missing = GeocodeConfig::from_app_config(&AppConfig::default());
        assert!(matches!(missing, Err(GeocodeError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_geocode_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode/json"))
            .and(query_param("address", "1 Infinite Loop, Cupertino"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let payload = client
            .geocode(&GeocodeRequest::new("1 Infinite Loop, Cupertino"))
            .await
            .unwrap();
        assert_eq!(payload, ok_payload());
    }

    #[tokio::test]
    async fn test_geocode_zero_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "status": "ZERO_RESULTS"})))
            .mount(&server)
            .await;

        let result = client_for(&server).geocode(&GeocodeRequest::new("nowhere")).await;
        assert!(matches!(result, Err(GeocodeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_geocode_http_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("address", "denied"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("address", "busy"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("address", "broken"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.geocode(&GeocodeRequest::new("denied")).await,
            Err(GeocodeError::AuthError(_))
        ));
        assert!(matches!(
            client.geocode(&GeocodeRequest::new("busy")).await,
            Err(GeocodeError::RateLimited(_))
        ));
        assert!(matches!(
            client.geocode(&GeocodeRequest::new("broken")).await,
            Err(GeocodeError::HttpError { status: 502 })
        ));
    }

    #[tokio::test]
    async fn test_geocode_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).geocode(&GeocodeRequest::new("somewhere")).await;
        assert!(matches!(result, Err(GeocodeError::Parse(_))));
    }

    #[tokio::test]
    async fn test_geocode_rejects_empty_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let result = client_for(&server).geocode(&GeocodeRequest::new("")).await;
        assert!(matches!(result, Err(GeocodeError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_rate_limiter_spacing() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
