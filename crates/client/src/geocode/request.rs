//! Geocoding request types and validation.

use serde::Serialize;

use crate::normalize::normalize_query;

/// Longest address the provider accepts, in bytes.
const MAX_ADDRESS_LEN: usize = 2048;

/// Forward geocoding request.
///
/// Serialized as query parameters of the provider's `geocode/json` endpoint.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct GeocodeRequest {
    /// Street address or place description (required).
    pub address: String,

    /// Region bias as a ccTLD code (e.g., "us").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Response language (e.g., "en").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl GeocodeRequest {
    /// Request for a bare address.
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Default::default() }
    }

    /// Validate the request parameters.
    pub fn validate(&self) -> Result<(), crate::geocode::GeocodeError> {
        use crate::geocode::GeocodeError;

        if self.address.trim().is_empty() {
            return Err(GeocodeError::InvalidQuery("address cannot be empty".to_string()));
        }

        if self.address.len() > MAX_ADDRESS_LEN {
            return Err(GeocodeError::InvalidQuery(format!(
                "address too long: {} bytes (max {MAX_ADDRESS_LEN})",
                self.address.len()
            )));
        }

        if let Some(region) = &self.region
            && !is_code(region)
        {
            return Err(GeocodeError::InvalidQuery(format!("invalid region: {region}")));
        }

        if let Some(language) = &self.language
            && !is_code(language)
        {
            return Err(GeocodeError::InvalidQuery(format!("invalid language: {language}")));
        }

        Ok(())
    }

    /// Cache key for this request.
    ///
    /// The normalized address, followed by any region or language bias,
    /// since those change the provider's answer.
    pub fn cache_key(&self) -> String {
        let mut key = normalize_query(&self.address);
        if let Some(region) = &self.region {
            key.push_str("|region=");
            key.push_str(&region.to_ascii_lowercase());
        }
        if let Some(language) = &self.language {
            key.push_str("|language=");
            key.push_str(&language.to_ascii_lowercase());
        }
        key
    }
}

/// Short locale-style code such as `us`, `en` or `pt-BR`.
fn is_code(value: &str) -> bool {
    !value.is_empty() && value.len() <= 10 && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeocodeError;

    #[test]
    fn test_valid_request() {
        let req = GeocodeRequest { region: Some("us".into()), ..GeocodeRequest::new("1600 Amphitheatre Pkwy") };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_address() {
        assert!(matches!(GeocodeRequest::new("  ").validate(), Err(GeocodeError::InvalidQuery(_))));
    }

    #[test]
    fn test_address_too_long() {
        assert!(GeocodeRequest::new("a".repeat(2049)).validate().is_err());
    }

    #[test]
    fn test_invalid_region() {
        let req = GeocodeRequest { region: Some("u s".into()), ..GeocodeRequest::new("Main St") };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_cache_key_normalizes_address() {
        let a = GeocodeRequest::new("  123 Main St,   Springfield IL ");
        let b = GeocodeRequest::new("123 main st, springfield il");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "123 main st, springfield il");
    }

    #[test]
    fn test_cache_key_includes_bias() {
        let plain = GeocodeRequest::new("Paris");
        let biased = GeocodeRequest { region: Some("US".into()), ..GeocodeRequest::new("Paris") };
        assert_ne!(plain.cache_key(), biased.cache_key());
        assert_eq!(biased.cache_key(), "paris|region=us");
    }
}
