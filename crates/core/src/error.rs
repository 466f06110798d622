//! Unified error types for geocache.
//!
//! Every cache operation returns these instead of substituting a default,
//! so callers decide whether a miss or a zero is an acceptable fallback.

use tokio_rusqlite::rusqlite;

/// Unified error types for the geocode cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored or supplied payload could not be (de)serialized.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// A stored timestamp could not be parsed.
    #[error("CACHE_ERROR: invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Closing the connection failed.
    #[error("CACHE_ERROR: close failed: {0}")]
    CloseFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::InvalidTimestamp(err.to_string())
    }
}
