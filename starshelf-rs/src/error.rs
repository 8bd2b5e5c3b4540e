//! Error types for starshelf-rs

use starshelf_common::{Rating, ServiceError};
use thiserror::Error;

/// Main error type for the rating store
#[derive(Error, Debug)]
pub enum Error {
    /// Persistence, settings or configuration failure
    #[error(transparent)]
    Common(#[from] starshelf_common::Error),

    /// External catalog call failed
    #[error("Catalog error: {0}")]
    Service(#[from] ServiceError),

    /// Every overflow shard name for a rating was already taken
    #[error("Unable to create overflow playlist for {rating} after {attempts} attempts")]
    ShardNamesExhausted { rating: Rating, attempts: u32 },

    /// The rated folder could not be created or found
    #[error("Rated folder unavailable: {0}")]
    RatedFolderUnavailable(String),
}

/// Convenience Result type using starshelf-rs Error
pub type Result<T> = std::result::Result<T, Error>;
