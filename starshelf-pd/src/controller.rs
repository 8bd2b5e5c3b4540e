//! Weighted Playback Controller
//!
//! Reacts to the player's "track changed" event:
//!
//! 1. A now-playing track rated at or below the skip threshold is skipped and
//!    nothing else happens for that event.
//! 2. With weighted playback enabled, after a short settle delay the queue is
//!    topped up with one weighted-random track from the playback context,
//!    unless the user has more than one track queued already.
//!
//! Enabling weighted playback fills the queue once immediately.

use crate::context::{context_tracks, eligible_tracks};
use crate::error::Result;
use crate::sampler::draw_one;
use crate::weights::weigh;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use starshelf_common::events::StarshelfEvent;
use starshelf_common::player::PlayerControl;
use starshelf_common::{Rating, TrackId};
use starshelf_rs::RatingSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// What a queue-fill attempt did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "track_id", rename_all = "snake_case")]
pub enum QueueFill {
    /// Weighted playback is off
    Disabled,
    /// The user already has more than one track queued
    QueueOccupied,
    /// Nothing is playing from a playlist, album or the liked collection
    NoContext,
    /// The context has no eligible track with a positive weight
    NoCandidates,
    /// The draw picked the track queued last time; nothing was queued
    Repeat(TrackId),
    Queued(TrackId),
}

/// Outcome of a "track changed" event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TrackChange {
    /// The new track was at or below the skip threshold
    Skipped { track_id: TrackId, rating: Rating },
    Filled { fill: QueueFill },
}

/// Keeps the player's queue topped up with weighted picks
pub struct WeightedPlayback {
    session: Arc<RatingSession>,
    player: Arc<dyn PlayerControl>,
    enabled: AtomicBool,
    last_queued: Mutex<Option<TrackId>>,
    rng: Mutex<StdRng>,
}

impl WeightedPlayback {
    /// Disabled controller drawing from OS entropy
    pub fn new(session: Arc<RatingSession>, player: Arc<dyn PlayerControl>) -> Self {
        Self::with_rng(session, player, StdRng::from_entropy())
    }

    /// Controller drawing from the given generator
    pub fn with_rng(session: Arc<RatingSession>, player: Arc<dyn PlayerControl>, rng: StdRng) -> Self {
        Self {
            session,
            player,
            enabled: AtomicBool::new(false),
            last_queued: Mutex::new(None),
            rng: Mutex::new(rng),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Turn weighted playback on or off
    ///
    /// Switching it on fills the queue once right away and returns that result.
    pub async fn set_enabled(&self, enabled: bool) -> Result<Option<QueueFill>> {
        let was_enabled = self.enabled.swap(enabled, Ordering::AcqRel);
        let message = if enabled {
            "Weighted shuffle enabled"
        } else {
            "Weighted shuffle disabled"
        };
        info!("{}", message);
        self.session.context().emit(StarshelfEvent::notice(message));

        if enabled && !was_enabled {
            return self.fill_queue().await.map(Some);
        }
        Ok(None)
    }

    /// Handle the player's "track changed" event
    pub async fn on_track_changed(&self) -> Result<TrackChange> {
        if let Some(track) = self.player.current_track().await {
            if let Some(rating) = self.session.should_skip(&track).await {
                info!("Skipping {} (rated {})", track, rating);
                self.player.skip_to_next().await?;
                self.session.context().emit(StarshelfEvent::TrackSkipped {
                    track_id: track.clone(),
                    rating,
                    timestamp: chrono::Utc::now(),
                });
                return Ok(TrackChange::Skipped { track_id: track, rating });
            }
        }

        if !self.is_enabled() {
            return Ok(TrackChange::Filled {
                fill: QueueFill::Disabled,
            });
        }

        let delay = self.session.context().config.settle_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let fill = self.fill_queue().await?;
        Ok(TrackChange::Filled { fill })
    }

    /// Enqueue one weighted pick if the user queue is nearly empty
    pub async fn fill_queue(&self) -> Result<QueueFill> {
        if !self.is_enabled() {
            return Ok(QueueFill::Disabled);
        }

        let queued = self.player.queued_tracks().await;
        if queued.len() > 1 {
            debug!("User queue holds {} tracks; not adding a weighted pick", queued.len());
            return Ok(QueueFill::QueueOccupied);
        }

        let Some(context) = self.player.current_context().await else {
            return Ok(QueueFill::NoContext);
        };
        let catalog = self.session.context().catalog.as_ref();
        let Some(tracks) = context_tracks(catalog, &context).await? else {
            return Ok(QueueFill::NoContext);
        };

        let current = self.player.current_track().await;
        let eligible = eligible_tracks(tracks, current.as_ref(), &queued);
        let ratings = self.session.ratings_snapshot().await;
        let default_rating = self.session.settings().await.default_rating;
        let candidates = weigh(&eligible, &ratings, default_rating);

        let picked = {
            let mut rng = self.rng();
            draw_one(&candidates, &mut *rng).cloned()
        };
        let Some(track) = picked else {
            debug!("No weighted candidate in {:?}", context);
            return Ok(QueueFill::NoCandidates);
        };

        if self.last_queued().as_ref() == Some(&track) {
            debug!("Weighted pick {} repeats the previous one; not queueing", track);
            return Ok(QueueFill::Repeat(track));
        }

        self.player.enqueue_next(&track).await?;
        *self.last_queued() = Some(track.clone());
        info!("Queued weighted pick {}", track);
        self.session.context().emit(StarshelfEvent::WeightedTrackQueued {
            track_id: track.clone(),
            timestamp: chrono::Utc::now(),
        });
        Ok(QueueFill::Queued(track))
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn last_queued(&self) -> MutexGuard<'_, Option<TrackId>> {
        self.last_queued.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for WeightedPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedPlayback")
            .field("enabled", &self.is_enabled())
            .field("last_queued", &*self.last_queued())
            .finish_non_exhaustive()
    }
}
