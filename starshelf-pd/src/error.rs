//! Error types for starshelf-pd

use starshelf_common::ServiceError;
use thiserror::Error;

/// Main error type for the playback director
#[derive(Error, Debug)]
pub enum Error {
    /// Rating store failure (rated folder creation, persistence)
    #[error(transparent)]
    Rating(#[from] starshelf_rs::Error),

    /// External catalog or player call failed
    #[error("Catalog error: {0}")]
    Service(#[from] ServiceError),

    /// The source playlist has no track with a positive weight
    #[error("No tracks with a positive weight in {0}")]
    NoWeightedTracks(String),

    /// The draw selected no track (a count of zero was requested)
    #[error("No tracks could be selected from {0}")]
    NothingSelected(String),

    /// Every disambiguated playlist name was already taken
    #[error("Unable to create weighted shuffle playlist {name:?} after {attempts} attempts")]
    PlaylistNamesExhausted { name: String, attempts: u32 },
}

/// Convenience Result type using starshelf-pd Error
pub type Result<T> = std::result::Result<T, Error>;
