//! Rating session
//!
//! The single owned context behind every rating operation. It holds the store
//! state behind one async mutex (single writer), the user settings, and the
//! coarse flags that make user clicks reentrancy-safe:
//!
//! - `click_in_flight`: a second click while one mutation runs is ignored
//! - `loading`: set while the rated folder is (re)loaded
//! - `sorting`: set while a playlist is being sorted by rating
//!
//! Every flag is released by a scoped guard, so no exit path can leave it set.

use crate::duplicates::{self, SyncAction, SyncReport};
use crate::error::{Error, Result};
use crate::reconcile::{self, LoadSummary};
use crate::shards;
use crate::state::{StoreContext, StoreState};
use starshelf_common::events::StarshelfEvent;
use starshelf_common::rating::shortcut_rating;
use starshelf_common::settings::{self, Settings};
use starshelf_common::{FolderId, PlaylistId, Rating, TrackId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Whether a rating change may add the track to the liked collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePolicy {
    /// Direct user action: honour the like threshold, surface its errors
    Apply,
    /// Propagated change: never touch the liked collection
    Suppress,
}

/// Applied rating transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingChange {
    pub track_id: TrackId,
    pub old_rating: Option<Rating>,
    pub new_rating: Option<Rating>,
    /// Playlist now holding the track (`None` after removal)
    pub playlist: Option<PlaylistId>,
    /// The rating was applied but adding the track to the liked collection failed
    pub like_error: Option<String>,
}

impl RatingChange {
    fn unchanged(track_id: &TrackId, rating: Option<Rating>, playlist: Option<PlaylistId>) -> Self {
        Self {
            track_id: track_id.clone(),
            old_rating: rating,
            new_rating: rating,
            playlist,
            like_error: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.old_rating == self.new_rating
    }
}

/// How a click was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickStatus {
    /// Another mutation, a load or a sort was running
    Ignored,
    Applied,
    /// The mutation failed; the message was also sent as a notification
    Failed(String),
}

/// Result of a rating click, for the shell to redraw the star widget
#[derive(Debug)]
pub struct ClickOutcome {
    pub status: ClickStatus,
    /// Rating the widget should show (0.0 after toggling off)
    pub display_rating: Rating,
    pub stars_visible: bool,
    /// Detached duplicate fan-out, if one was started
    pub duplicate_sync: Option<JoinHandle<SyncReport>>,
}

/// Scoped hold on one of the session flags
pub(crate) struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlagGuard(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owned rating store session
pub struct RatingSession {
    ctx: StoreContext,
    settings: RwLock<Settings>,
    state: Mutex<StoreState>,
    click_in_flight: AtomicBool,
    loading: AtomicBool,
    sorting: AtomicBool,
}

impl RatingSession {
    /// Create a session; settings are loaded (and normalised) immediately
    ///
    /// Ratings are not loaded until [`RatingSession::load`] is called.
    pub fn new(ctx: StoreContext) -> Result<Self> {
        let settings = settings::load_settings(ctx.store.as_ref())?;
        Ok(Self {
            ctx,
            settings: RwLock::new(settings),
            state: Mutex::new(StoreState::default()),
            click_in_flight: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            sorting: AtomicBool::new(false),
        })
    }

    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Replace and persist the user settings
    pub async fn update_settings(&self, updated: Settings) -> Result<()> {
        settings::save_settings(self.ctx.store.as_ref(), &updated)?;
        *self.settings.write().await = updated;
        Ok(())
    }

    /// True while a load, sort or click mutation is running
    pub fn is_busy(&self) -> bool {
        self.loading.load(Ordering::Acquire)
            || self.sorting.load(Ordering::Acquire)
            || self.click_in_flight.load(Ordering::Acquire)
    }

    /// (Re)load the rated folder, mapping and index
    pub async fn load(&self) -> Result<LoadSummary> {
        let mut state = self.state.lock().await;
        self.loading.store(true, Ordering::Release);
        let _loading = ReleaseOnDrop(&self.loading);
        reconcile::load(&self.ctx, &mut state).await
    }

    /// Make `folder` the rated folder and reload everything from it
    pub async fn assign_rated_folder(&self, folder: FolderId) -> Result<LoadSummary> {
        info!("Rated folder reassigned to {}", folder);
        let mut state = self.state.lock().await;
        self.loading.store(true, Ordering::Release);
        let _loading = ReleaseOnDrop(&self.loading);
        self.ctx.save_rated_folder(Some(&folder))?;
        reconcile::load(&self.ctx, &mut state).await
    }

    pub async fn rating_of(&self, track: &str) -> Option<Rating> {
        self.state.lock().await.index.rating(track)
    }

    /// Copy of the whole track → rating index
    pub async fn ratings_snapshot(&self) -> HashMap<TrackId, Rating> {
        self.state.lock().await.index.ratings()
    }

    pub async fn rated_folder(&self) -> Option<FolderId> {
        self.state.lock().await.rated_folder.clone()
    }

    /// The rated folder, created on first use
    pub async fn ensure_rated_folder(&self) -> Result<FolderId> {
        let mut state = self.state.lock().await;
        ensure_folder(&self.ctx, &mut state).await
    }

    /// Rating at or below the skip threshold, if the track should be skipped
    pub async fn should_skip(&self, track: &str) -> Option<Rating> {
        let threshold = self.settings.read().await.skip_threshold?;
        self.rating_of(track).await.filter(|rating| *rating <= threshold)
    }

    /// Set a track's rating (Unrated → Rated or Rated(v) → Rated(w))
    ///
    /// Setting the rating a track already has changes nothing; toggling off is
    /// the click path's job. On failure the index keeps whatever steps
    /// completed. A failed like does not fail the change; it is reported in
    /// [`RatingChange::like_error`] and as a failure notification.
    pub async fn set_rating(
        &self,
        track: &TrackId,
        rating: Rating,
        like: LikePolicy,
        propagated: bool,
    ) -> Result<RatingChange> {
        let like_threshold = self.settings.read().await.like_threshold;
        let mut state = self.state.lock().await;

        let previous = state.index.get(track).cloned();
        if let Some(entry) = &previous {
            if entry.rating == rating {
                return Ok(RatingChange::unchanged(track, Some(rating), Some(entry.playlist.clone())));
            }
            self.ctx.catalog.remove_track(&entry.playlist, track).await?;
            state.index.remove(track);
        }

        let folder = ensure_folder(&self.ctx, &mut state).await?;
        let target = shards::resolve_write_target(&self.ctx, &mut state, &folder, rating).await?;
        self.ctx
            .catalog
            .add_tracks(&target, std::slice::from_ref(track))
            .await?;
        state.index.insert(track.clone(), rating, target.clone());

        let verb = if previous.is_some() { "Moved" } else { "Added" };
        let name = state.mapping.name_of(&target);
        drop(state);
        info!("{} {} to {}", verb, track, name);
        self.ctx.emit(StarshelfEvent::notice(format!("{} to {}", verb, name)));

        let old_rating = previous.map(|entry| entry.rating);
        self.ctx.emit(StarshelfEvent::RatingChanged {
            track_id: track.clone(),
            old_rating,
            new_rating: Some(rating),
            propagated,
            timestamp: chrono::Utc::now(),
        });

        // The rating stands even if liking fails; the failure is only reported
        let like_error = match (like, like_threshold) {
            (LikePolicy::Apply, Some(threshold)) if rating >= threshold => {
                match self.like_track(track).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!("Failed to like {} after rating it {}: {}", track, rating, e);
                        let message = format!("Error liking track: {}", e);
                        self.ctx.emit(StarshelfEvent::failure(message.clone()));
                        Some(message)
                    }
                }
            }
            _ => None,
        };

        Ok(RatingChange {
            track_id: track.clone(),
            old_rating,
            new_rating: Some(rating),
            playlist: Some(target),
            like_error,
        })
    }

    /// Add `track` to the liked collection unless it is already there
    async fn like_track(&self, track: &TrackId) -> Result<()> {
        if !self.ctx.catalog.get_liked_state(track).await? {
            debug!("Liking {}", track);
            self.ctx.catalog.set_liked(track, true).await?;
        }
        Ok(())
    }

    /// Clear a track's rating (Rated → Unrated); unrated tracks are left alone
    pub async fn remove_rating(&self, track: &TrackId, propagated: bool) -> Result<RatingChange> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.index.get(track).cloned() else {
            return Ok(RatingChange::unchanged(track, None, None));
        };

        self.ctx.catalog.remove_track(&entry.playlist, track).await?;
        state.index.remove(track);
        let name = state.mapping.name_of(&entry.playlist);
        drop(state);

        info!("Removed {} from {}", track, name);
        self.ctx.emit(StarshelfEvent::notice(format!("Removed from {}", name)));
        self.ctx.emit(StarshelfEvent::RatingChanged {
            track_id: track.clone(),
            old_rating: Some(entry.rating),
            new_rating: None,
            propagated,
            timestamp: chrono::Utc::now(),
        });
        Ok(RatingChange {
            track_id: track.clone(),
            old_rating: Some(entry.rating),
            new_rating: None,
            playlist: None,
            like_error: None,
        })
    }

    /// Handle a star click on `track`
    ///
    /// Clicking the rating the track already has removes it. Failures become a
    /// notification; they never escape as errors. When duplicate sync is on,
    /// the fan-out is spawned after the primary change succeeds and is not
    /// awaited.
    pub async fn click_rating(self: &Arc<Self>, track: &TrackId, rating: Rating) -> ClickOutcome {
        if self.is_loading() || self.sorting.load(Ordering::Acquire) {
            debug!("Ignoring rating click on {}: store busy", track);
            return self.ignored(track);
        }
        let Some(_click) = FlagGuard::acquire(&self.click_in_flight) else {
            debug!("Ignoring rating click on {}: another click in flight", track);
            return self.ignored(track);
        };

        let current = self.rating_of(track).await;
        let toggle_off = current == Some(rating);
        let (action, result) = if toggle_off {
            (SyncAction::Remove, self.remove_rating(track, false).await)
        } else {
            (
                SyncAction::Set(rating),
                self.set_rating(track, rating, LikePolicy::Apply, false).await,
            )
        };
        let (display_rating, stars_visible) = if toggle_off {
            (Rating::MIN, false)
        } else {
            (rating, true)
        };

        let status = match result {
            Ok(_) => ClickStatus::Applied,
            Err(e) => {
                error!("Error updating rating of {}: {}", track, e);
                let message = format!("Error updating rating: {}", e);
                self.ctx.emit(StarshelfEvent::failure(message.clone()));
                ClickStatus::Failed(message)
            }
        };

        let duplicate_sync = if status == ClickStatus::Applied && self.settings.read().await.sync_duplicate_songs {
            Some(duplicates::spawn_sync(Arc::clone(self), track.clone(), action))
        } else {
            None
        };

        ClickOutcome {
            status,
            display_rating,
            stars_visible,
            duplicate_sync,
        }
    }

    /// Keyboard shortcut for the now-playing track
    ///
    /// `None` when shortcuts are disabled, the key is not a shortcut or
    /// nothing is playing.
    pub async fn keyboard_rating(self: &Arc<Self>, key: char, now_playing: Option<&TrackId>) -> Option<ClickOutcome> {
        if !self.settings.read().await.enable_keyboard_shortcuts {
            return None;
        }
        let rating = shortcut_rating(key)?;
        let track = now_playing?;
        Some(self.click_rating(track, rating).await)
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Hold the sorting flag; `None` while another sort runs
    pub(crate) fn begin_sort(&self) -> Option<FlagGuard<'_>> {
        FlagGuard::acquire(&self.sorting)
    }

    fn ignored(&self, track: &str) -> ClickOutcome {
        // A load may hold the state; show nothing rather than wait for it
        let current = self
            .state
            .try_lock()
            .ok()
            .and_then(|state| state.index.rating(track));
        ClickOutcome {
            status: ClickStatus::Ignored,
            display_rating: current.unwrap_or(Rating::MIN),
            stars_visible: current.is_some(),
            duplicate_sync: None,
        }
    }
}

impl std::fmt::Debug for RatingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingSession")
            .field("ctx", &self.ctx)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

/// Clears a flag that was set unconditionally
struct ReleaseOnDrop<'a>(&'a AtomicBool);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn ensure_folder(ctx: &StoreContext, state: &mut StoreState) -> Result<FolderId> {
    if let Some(folder) = &state.rated_folder {
        return Ok(folder.clone());
    }
    let name = &ctx.config.rated_folder_name;
    let folder = ctx
        .catalog
        .create_folder(name)
        .await
        .map_err(|e| Error::RatedFolderUnavailable(e.to_string()))?;
    info!("Created rated folder {:?} ({})", name, folder);
    ctx.save_rated_folder(Some(&folder))?;
    state.rated_folder = Some(folder.clone());
    Ok(folder)
}
