//! Duplicate-Sync Coordinator
//!
//! Propagates a rating change to every other catalog track sharing the
//! changed track's unique recording code (other releases of the same
//! recording). Best-effort: each duplicate is handled independently, failures
//! are logged and collected, and nothing is rolled back.

use crate::session::{LikePolicy, RatingSession};
use starshelf_common::{Rating, TrackId};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Change to replay on the duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "rating")]
pub enum SyncAction {
    Set(Rating),
    Remove,
}

/// What a fan-out did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub updated: Vec<TrackId>,
    /// Duplicates already in the requested state
    pub skipped: Vec<TrackId>,
    pub failed: Vec<(TrackId, String)>,
    /// Metadata or search failure that prevented finding duplicates
    pub lookup_error: Option<String>,
}

/// Start a detached fan-out for `track`
///
/// The handle may be dropped; the task runs to completion regardless.
pub fn spawn_sync(session: Arc<RatingSession>, track: TrackId, action: SyncAction) -> JoinHandle<SyncReport> {
    tokio::spawn(async move { sync_duplicates(&session, &track, action).await })
}

/// Apply `action` to every duplicate of `track`
pub async fn sync_duplicates(session: &RatingSession, track: &TrackId, action: SyncAction) -> SyncReport {
    let mut report = SyncReport::default();

    let duplicates = match find_duplicates(session, track).await {
        Ok(duplicates) => duplicates,
        Err(e) => {
            warn!("Duplicate lookup for {} failed: {}", track, e);
            report.lookup_error = Some(e.to_string());
            return report;
        }
    };

    for duplicate in duplicates {
        let current = session.rating_of(&duplicate).await;
        let result = match action {
            SyncAction::Set(rating) if current == Some(rating) => {
                report.skipped.push(duplicate);
                continue;
            }
            SyncAction::Set(rating) => session
                .set_rating(&duplicate, rating, LikePolicy::Suppress, true)
                .await
                .map(|_| ()),
            SyncAction::Remove if current.is_none() => {
                report.skipped.push(duplicate);
                continue;
            }
            SyncAction::Remove => session.remove_rating(&duplicate, true).await.map(|_| ()),
        };

        match result {
            Ok(()) => {
                debug!("Synced duplicate {} of {} ({:?})", duplicate, track, action);
                report.updated.push(duplicate);
            }
            Err(e) => {
                warn!("Failed to sync duplicate {} of {}: {}", duplicate, track, e);
                report.failed.push((duplicate, e.to_string()));
            }
        }
    }

    if !report.updated.is_empty() || !report.failed.is_empty() {
        info!(
            "Duplicate sync for {}: {} updated, {} failed",
            track,
            report.updated.len(),
            report.failed.len()
        );
    }
    report
}

/// Other tracks with the same unique recording code
async fn find_duplicates(
    session: &RatingSession,
    track: &TrackId,
) -> starshelf_common::ServiceResult<Vec<TrackId>> {
    let catalog = &session.context().catalog;
    let metadata = catalog.get_track_metadata(track).await?;
    let Some(code) = metadata.unique_recording_code else {
        debug!("Track {} has no recording code; nothing to sync", track);
        return Ok(Vec::new());
    };
    let found = catalog.search_tracks_by_recording_code(&code).await?;
    let mut seen = HashSet::new();
    Ok(found
        .into_iter()
        .filter(|candidate| candidate != track && seen.insert(candidate.clone()))
        .collect())
}
