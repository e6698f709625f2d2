//! Error types for nijiradio-station
//!
//! Command errors map onto HTTP statuses in [`crate::api`].

use thiserror::Error;

/// Main error type for the station server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Checkpoint could not be made durable
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Checkpoint or message encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<nijiradio_common::Error> for Error {
    fn from(err: nijiradio_common::Error) -> Self {
        use nijiradio_common::Error as Common;
        match err {
            Common::Database(e) => Error::Database(e),
            Common::Config(msg) => Error::Config(msg),
            Common::InvalidInput(msg) => Error::BadRequest(msg),
            Common::Io(e) => Error::Internal(e.to_string()),
        }
    }
}

/// Convenience Result type using the station Error
pub type Result<T> = std::result::Result<T, Error>;
