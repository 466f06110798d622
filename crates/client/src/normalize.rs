//! Query normalization for cache keys.
//!
//! The cache matches keys exactly, so every caller must reduce an address
//! to the same form before looking it up.

/// Normalize a free-form address: trim, collapse internal whitespace and
/// lowercase.
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
