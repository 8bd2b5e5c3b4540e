//! Common error types for Starshelf

use crate::catalog::ServiceError;
use thiserror::Error;

/// Common result type for Starshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Starshelf crates
#[derive(Error, Debug)]
pub enum Error {
    /// External catalog/player service error
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted value could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
