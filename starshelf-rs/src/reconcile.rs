//! Rated-folder discovery and reload
//!
//! Finds the rated folder (persisted identity, or a one-time lookup by name),
//! reconciles the persisted mapping against the folder's direct children and
//! rebuilds the rating index from every rating playlist. A folder that has
//! vanished while ratings were mapped resets local state instead of failing.

use crate::error::Result;
use crate::index::{ConflictingEntry, RatingIndex};
use crate::mapping::PlaylistMapping;
use crate::state::{StoreContext, StoreState};
use starshelf_common::events::StarshelfEvent;
use starshelf_common::settings;
use starshelf_common::{FolderId, ServiceError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a load found
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub rated_tracks: usize,
    pub rating_playlists: usize,
    /// The persisted mapping was rewritten
    pub mapping_changed: bool,
    /// The rated folder was gone and local state was cleared
    pub folder_reset: bool,
    /// Tracks found in more than one rating playlist (last scanned kept)
    pub conflicting_entries: Vec<ConflictingEntry>,
}

/// Rebuild `state` from the persisted identity and the catalog
pub async fn load(ctx: &StoreContext, state: &mut StoreState) -> Result<LoadSummary> {
    let store = ctx.store.as_ref();
    let mut mapping = PlaylistMapping::from_targets(settings::load_playlist_uris(store)?);

    let folder_id = match settings::load_rated_folder(store)? {
        Some(id) => Some(id),
        None => migrate_by_name(ctx).await?,
    };

    let children = match &folder_id {
        Some(id) => match ctx.catalog.list_folder_contents(Some(id)).await {
            Ok(contents) => Some(contents.playlists),
            Err(ServiceError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let Some(children) = children else {
        return reset_missing_folder(ctx, state, folder_id, mapping);
    };
    let diff = mapping.reconcile(&children);
    if diff.changed() {
        info!(
            "Rating playlist mapping reconciled: {} removed, {} added",
            diff.removed.len(),
            diff.added.len()
        );
        ctx.save_mapping(&mapping)?;
    }

    let mut scans = Vec::new();
    for (rating, playlist) in mapping.scan_order() {
        let tracks = ctx.catalog.get_playlist_tracks(&playlist).await?;
        debug!("Scanned {} ({}): {} tracks", mapping.name_of(&playlist), rating, tracks.len());
        scans.push((rating, playlist, tracks));
    }
    let (index, conflicting_entries) = RatingIndex::from_scans(scans);

    let summary = LoadSummary {
        rated_tracks: index.len(),
        rating_playlists: mapping.playlist_count(),
        mapping_changed: diff.changed(),
        folder_reset: false,
        conflicting_entries,
    };

    state.rated_folder = folder_id;
    state.mapping = mapping;
    state.index = index;

    info!(
        "Loaded {} rated tracks from {} rating playlists",
        summary.rated_tracks, summary.rating_playlists
    );
    ctx.emit(StarshelfEvent::RatingsLoaded {
        rated_tracks: summary.rated_tracks,
        rating_playlists: summary.rating_playlists,
        timestamp: chrono::Utc::now(),
    });
    Ok(summary)
}

/// One-time lookup of a folder carrying the rated folder name
async fn migrate_by_name(ctx: &StoreContext) -> Result<Option<FolderId>> {
    let root = ctx.catalog.list_folder_contents(None).await?;
    let found = root
        .find_folder_by_name(&ctx.config.rated_folder_name)
        .map(|folder| folder.id.clone());
    if let Some(id) = &found {
        info!("Adopting existing folder {:?} ({}) as rated folder", ctx.config.rated_folder_name, id);
        ctx.save_rated_folder(Some(id))?;
    }
    Ok(found)
}

fn reset_missing_folder(
    ctx: &StoreContext,
    state: &mut StoreState,
    folder_id: Option<FolderId>,
    mapping: PlaylistMapping,
) -> Result<LoadSummary> {
    state.clear();

    if !mapping.is_empty() {
        warn!("Rated folder is gone; clearing {} rating playlist mappings", mapping.targets().len());
        ctx.save_mapping(&PlaylistMapping::default())?;
        ctx.save_rated_folder(None)?;
        ctx.emit(StarshelfEvent::RatedFolderReset {
            timestamp: chrono::Utc::now(),
        });
        return Ok(LoadSummary {
            folder_reset: true,
            ..LoadSummary::default()
        });
    }

    if let Some(stale) = folder_id {
        debug!("Forgetting stale rated folder id {}", stale);
        ctx.save_rated_folder(None)?;
    }
    Ok(LoadSummary::default())
}
