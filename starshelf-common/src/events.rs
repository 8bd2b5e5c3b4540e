//! Event types for the Starshelf event system
//!
//! The UI shell subscribes to the [`EventBus`] to refresh star widgets and to
//! show user-visible notifications. The core never renders anything itself.

use crate::catalog::{PlaylistId, TrackId};
use crate::rating::Rating;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Starshelf event types
///
/// Events are broadcast via EventBus and can be serialized for transmission to
/// a UI process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StarshelfEvent {
    /// A track's rating changed (including removal)
    ///
    /// Triggers:
    /// - UI: redraw star widgets showing this track
    RatingChanged {
        track_id: TrackId,
        old_rating: Option<Rating>,
        new_rating: Option<Rating>,
        /// True when applied by duplicate sync rather than a direct user action
        propagated: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Message meant for the user (success or failure of an action)
    Notification {
        message: String,
        is_error: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Ratings were (re)loaded from the rated folder
    RatingsLoaded {
        rated_tracks: usize,
        rating_playlists: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The rated folder disappeared and local state was cleared
    RatedFolderReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Weighted playback inserted a track to play next
    WeightedTrackQueued {
        track_id: TrackId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A weighted-shuffle playlist was materialized
    WeightedShuffleCreated {
        playlist_id: PlaylistId,
        name: String,
        track_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A low-rated track was skipped on playback
    TrackSkipped {
        track_id: TrackId,
        rating: Rating,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl StarshelfEvent {
    /// Informational notification
    pub fn notice(message: impl Into<String>) -> Self {
        StarshelfEvent::Notification {
            message: message.into(),
            is_error: false,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Failure notification
    pub fn failure(message: impl Into<String>) -> Self {
        StarshelfEvent::Notification {
            message: message.into(),
            is_error: true,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Broadcast bus for [`StarshelfEvent`]
///
/// Cheap to clone; clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StarshelfEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<StarshelfEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: StarshelfEvent,
    ) -> Result<usize, broadcast::error::SendError<StarshelfEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: StarshelfEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(StarshelfEvent::notice("hello")).is_err());
        // Lossy variant never fails
        bus.emit_lossy(StarshelfEvent::notice("hello"));
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(StarshelfEvent::failure("boom")).unwrap();
        match rx.recv().await.unwrap() {
            StarshelfEvent::Notification { message, is_error, .. } => {
                assert_eq!(message, "boom");
                assert!(is_error);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = StarshelfEvent::RatingChanged {
            track_id: "trk:abc".to_string(),
            old_rating: None,
            new_rating: Some("4.0".parse().unwrap()),
            propagated: false,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RatingChanged");
        assert_eq!(json["new_rating"], "4.0");
        assert!(json["old_rating"].is_null());
    }
}
