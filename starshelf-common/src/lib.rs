//! # Starshelf Common Library
//!
//! Shared code for the Starshelf crates including:
//! - Rating values and rating-playlist naming
//! - Catalog/playlist service and player control interfaces
//! - In-memory catalog backend
//! - Key-value persistence and user settings
//! - Event types (StarshelfEvent) and EventBus
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod kv;
pub mod player;
pub mod rating;
pub mod settings;

pub use catalog::{CatalogService, FolderId, PlaylistId, ServiceError, ServiceResult, TrackId};
pub use error::{Error, Result};
pub use rating::Rating;
