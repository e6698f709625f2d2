//! Errors raised by the shared NijiRadio code
//!
//! The station server wraps these into its own error type, where they pick
//! up an HTTP status.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Opening or preparing the checkpoint database failed
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file or data folder could not be read or created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file present but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// A track or playlist that cannot be scheduled
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
