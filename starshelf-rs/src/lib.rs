//! # Starshelf Rating Store (starshelf-rs)
//!
//! Persists per-track ratings by placing each rated track into a playlist named
//! after its rating, inside a single "Rated" folder of an external catalog.
//!
//! **Purpose:** Discover and reconcile the rating playlists, keep an in-memory
//! track → rating index, apply rate/unrate transitions, split full playlists
//! into overflow shards, and propagate changes to duplicate releases.
//!
//! **Architecture:** One owned [`RatingSession`] holds all mutable state behind
//! a single async mutex; every operation goes through it.

pub mod album;
pub mod duplicates;
pub mod error;
pub mod index;
pub mod mapping;
pub mod reconcile;
pub mod session;
pub mod shards;
pub mod sort;
pub mod state;

pub use duplicates::{SyncAction, SyncReport};
pub use error::{Error, Result};
pub use index::{RatedEntry, RatingIndex};
pub use mapping::PlaylistMapping;
pub use reconcile::LoadSummary;
pub use session::{ClickOutcome, ClickStatus, LikePolicy, RatingChange, RatingSession};
pub use sort::SortOutcome;
pub use state::StoreContext;
