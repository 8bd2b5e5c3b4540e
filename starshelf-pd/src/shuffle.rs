//! Weighted-shuffle materialization
//!
//! Draws up to `k` distinct tracks from a source playlist, weighted by
//! rating, and writes them to a new playlist in the rated folder named after
//! the source: `"<source> (Weighted <k>)"`, or `"<source> (Weighted <k>) (<n>)"`
//! when that name is taken.

use crate::error::{Error, Result};
use crate::sampler::{draw_many, total_weight};
use crate::weights::weigh;
use rand::Rng;
use serde::Serialize;
use starshelf_common::events::StarshelfEvent;
use starshelf_common::{FolderId, PlaylistId, TrackId};
use starshelf_rs::{RatingSession, StoreContext};
use tracing::{debug, info};

/// A materialized weighted-shuffle playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightedShuffle {
    pub playlist_id: PlaylistId,
    pub name: String,
    /// Drawn tracks, in draw order
    pub tracks: Vec<TrackId>,
}

/// Create a weighted shuffle of `source` with at most `k` tracks
///
/// Fails before creating anything when no source track has a positive weight.
pub async fn materialize_weighted_shuffle<R: Rng + ?Sized>(
    session: &RatingSession,
    source: &PlaylistId,
    k: usize,
    rng: &mut R,
) -> Result<WeightedShuffle> {
    let ctx = session.context();
    let source_name = ctx.catalog.get_playlist_name(source).await?;
    let source_tracks = ctx.catalog.get_playlist_tracks(source).await?;

    let ratings = session.ratings_snapshot().await;
    let default_rating = session.settings().await.default_rating;
    let candidates = weigh(&source_tracks, &ratings, default_rating);
    if total_weight(&candidates) <= 0.0 {
        return Err(Error::NoWeightedTracks(source_name));
    }

    let drawn = draw_many(candidates, k, rng);
    debug!("Drew {} of {} requested tracks from {}", drawn.len(), k, source_name);
    if drawn.is_empty() {
        return Err(Error::NothingSelected(source_name));
    }

    let folder = session.ensure_rated_folder().await?;
    let base_name = format!("{} (Weighted {})", source_name, k);
    let (playlist_id, name) = create_unique_playlist(ctx, &base_name, &folder).await?;

    for batch in drawn.chunks(ctx.config.insert_batch_size.max(1)) {
        ctx.catalog.add_tracks(&playlist_id, batch).await?;
    }

    info!("Created weighted shuffle {} with {} tracks", name, drawn.len());
    ctx.emit(StarshelfEvent::notice(format!(
        "Weighted shuffle playlist created with {} tracks!",
        drawn.len()
    )));
    ctx.emit(StarshelfEvent::WeightedShuffleCreated {
        playlist_id: playlist_id.clone(),
        name: name.clone(),
        track_count: drawn.len(),
        timestamp: chrono::Utc::now(),
    });

    Ok(WeightedShuffle {
        playlist_id,
        name,
        tracks: drawn,
    })
}

/// Create `base_name`, falling back to numbered variants on failure
async fn create_unique_playlist(
    ctx: &StoreContext,
    base_name: &str,
    folder: &FolderId,
) -> Result<(PlaylistId, String)> {
    match ctx.catalog.create_playlist(base_name, folder).await {
        Ok(id) => return Ok((id, base_name.to_string())),
        Err(e) => debug!("Playlist name {:?} unavailable: {}", base_name, e),
    }

    let attempts = ctx.config.max_name_attempts;
    for n in 1..=attempts {
        let name = format!("{} ({})", base_name, n);
        match ctx.catalog.create_playlist(&name, folder).await {
            Ok(id) => return Ok((id, name)),
            Err(e) => debug!("Playlist name {:?} unavailable: {}", name, e),
        }
    }
    Err(Error::PlaylistNamesExhausted {
        name: base_name.to_string(),
        attempts,
    })
}
