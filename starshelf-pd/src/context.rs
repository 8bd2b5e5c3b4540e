//! Playback context → candidate tracks

use starshelf_common::player::PlaybackContext;
use starshelf_common::{CatalogService, ServiceResult, TrackId};
use tracing::debug;

/// Every track reachable from the playback context
///
/// `Ok(None)` when the context is not a playlist, album or the liked
/// collection.
pub async fn context_tracks(
    catalog: &dyn CatalogService,
    context: &PlaybackContext,
) -> ServiceResult<Option<Vec<TrackId>>> {
    let tracks = match context {
        PlaybackContext::Playlist(playlist) => catalog.get_playlist_tracks(playlist).await?,
        PlaybackContext::Album(album) => catalog.get_album_tracks(album).await?,
        PlaybackContext::Collection => catalog.get_liked_tracks().await?,
        PlaybackContext::Other(uri) => {
            debug!("Unsupported playback context {}", uri);
            return Ok(None);
        }
    };
    Ok(Some(tracks))
}

/// Drop the playing track, queued tracks and repeats, keeping order
pub fn eligible_tracks(tracks: Vec<TrackId>, current: Option<&TrackId>, queued: &[TrackId]) -> Vec<TrackId> {
    let mut seen = std::collections::HashSet::new();
    tracks
        .into_iter()
        .filter(|track| Some(track) != current && !queued.contains(track))
        .filter(|track| seen.insert(track.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use starshelf_common::catalog::MemoryCatalog;

    fn ids(values: &[&str]) -> Vec<TrackId> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_resolves_supported_contexts() {
        let catalog = MemoryCatalog::new();
        let playlist = catalog.insert_playlist("Mix", None, ids(&["p1", "p2"]));
        catalog.insert_album("alb", &["a1"]);
        catalog.insert_liked(&["l1", "l2", "l3"]);

        let got = context_tracks(&catalog, &PlaybackContext::Playlist(playlist)).await.unwrap();
        assert_eq!(got, Some(ids(&["p1", "p2"])));
        let got = context_tracks(&catalog, &PlaybackContext::Album("alb".into())).await.unwrap();
        assert_eq!(got, Some(ids(&["a1"])));
        let got = context_tracks(&catalog, &PlaybackContext::Collection).await.unwrap();
        assert_eq!(got.unwrap().len(), 3);
        let got = context_tracks(&catalog, &PlaybackContext::Other("radio".into())).await.unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_eligible_excludes_current_and_queued() {
        let current = "b".to_string();
        let eligible = eligible_tracks(ids(&["a", "b", "c", "d", "a"]), Some(&current), &ids(&["d"]));
        assert_eq!(eligible, ids(&["a", "c"]));
    }
}
