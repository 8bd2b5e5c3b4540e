//! Player control interface
//!
//! The host media player owns playback and the queue. The director only needs
//! to observe what is playing, see the user queue, insert a track to play next,
//! and skip.

use crate::catalog::{PlaylistId, ServiceResult, TrackId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Source the player is currently drawing tracks from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PlaybackContext {
    Playlist(PlaylistId),
    Album(String),
    /// The user's liked (saved-tracks) collection
    Collection,
    /// Anything else (artist radio, search results, ...)
    Other(String),
}

impl PlaybackContext {
    /// Classify a context URI such as `spotify:playlist:37i9dQZF1DX` or
    /// `spotify:user:alice:collection`
    pub fn from_uri(uri: &str) -> Self {
        let last_segment = || uri.rsplit(':').next().unwrap_or(uri).to_string();
        if uri.contains("playlist") {
            PlaybackContext::Playlist(uri.to_string())
        } else if uri.contains("album") {
            PlaybackContext::Album(last_segment())
        } else if uri.contains("collection") {
            PlaybackContext::Collection
        } else {
            PlaybackContext::Other(uri.to_string())
        }
    }
}

/// Host player
#[async_trait]
pub trait PlayerControl: Send + Sync {
    /// Context of the current playback session, if any
    async fn current_context(&self) -> Option<PlaybackContext>;

    /// Currently playing track, if any
    async fn current_track(&self) -> Option<TrackId>;

    /// Tracks explicitly queued to play next, in play order
    async fn queued_tracks(&self) -> Vec<TrackId>;

    /// Insert a track to play after the current one (not "play now")
    async fn enqueue_next(&self, track: &TrackId) -> ServiceResult<()>;

    /// Skip to the next track
    async fn skip_to_next(&self) -> ServiceResult<()>;
}
