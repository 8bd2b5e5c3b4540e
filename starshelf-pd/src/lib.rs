//! # Starshelf Playback Director (starshelf-pd)
//!
//! Turns accumulated ratings into playback behaviour.
//!
//! **Purpose:** Weight tracks by rating, draw them at random in proportion to
//! weight, keep the player's queue topped up with one weighted pick, skip
//! low-rated tracks, and materialize finite weighted-shuffle playlists.
//!
//! **Architecture:** Pure weighting and sampling functions at the bottom;
//! [`WeightedPlayback`] and [`materialize_weighted_shuffle`] drive them from
//! the rating session, the catalog and the player.

pub mod context;
pub mod controller;
pub mod error;
pub mod sampler;
pub mod shuffle;
pub mod weights;

pub use controller::{QueueFill, TrackChange, WeightedPlayback};
pub use error::{Error, Result};
pub use sampler::{draw_many, draw_one, Candidate};
pub use shuffle::{materialize_weighted_shuffle, WeightedShuffle};
pub use weights::weight_for;
