//! Overflow-Shard Manager
//!
//! Resolves which playlist a newly rated track is written to. A rating's
//! playlist holds at most `shard_capacity` tracks; once the current one is
//! full, a successor named `<rating>(<n>)` is created and becomes the new
//! target. Full shards are never written again, even after removals.

use crate::error::{Error, Result};
use crate::state::{StoreContext, StoreState};
use starshelf_common::rating::shard_name;
use starshelf_common::{CatalogService, FolderId, PlaylistId, Rating};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Playlist that should receive the next track rated `rating`
///
/// Creates the primary playlist on first use, or a new overflow shard when the
/// current target is full. Either way the mapping is updated and persisted
/// before returning.
pub async fn resolve_write_target(
    ctx: &StoreContext,
    state: &mut StoreState,
    folder: &FolderId,
    rating: Rating,
) -> Result<PlaylistId> {
    let current = match state.mapping.target(rating) {
        Some(current) => current.clone(),
        None => {
            let name = rating.to_string();
            let playlist = ctx.catalog.create_playlist(&name, folder).await?;
            info!("Created rating playlist {} ({})", name, playlist);
            schedule_private(&ctx.catalog, &playlist, ctx.config.settle_delay);
            state.mapping.set_target(rating, playlist.clone(), name);
            ctx.save_mapping(&state.mapping)?;
            return Ok(playlist);
        }
    };

    let count = ctx.catalog.get_playlist_tracks(&current).await?.len();
    if count < ctx.config.shard_capacity {
        return Ok(current);
    }

    debug!(
        "Rating playlist {} for {} is full ({} tracks), creating overflow shard",
        current, rating, count
    );
    let (playlist, name) = create_shard(ctx, folder, rating).await?;
    state.mapping.set_target(rating, playlist.clone(), name);
    ctx.save_mapping(&state.mapping)?;
    Ok(playlist)
}

/// Probe shard names sequentially; the first successful create wins
async fn create_shard(ctx: &StoreContext, folder: &FolderId, rating: Rating) -> Result<(PlaylistId, String)> {
    let attempts = ctx.config.max_name_attempts;
    for n in 1..=attempts {
        let name = shard_name(rating, n);
        match ctx.catalog.create_playlist(&name, folder).await {
            Ok(playlist) => {
                info!("Created overflow shard {} ({})", name, playlist);
                schedule_private(&ctx.catalog, &playlist, ctx.config.settle_delay);
                return Ok((playlist, name));
            }
            Err(e) => debug!("Shard name {} unavailable: {}", name, e),
        }
    }
    Err(Error::ShardNamesExhausted { rating, attempts })
}

/// Mark a new playlist private once the service has settled
///
/// Detached; a failure only costs visibility, so it is logged and dropped.
pub fn schedule_private(catalog: &Arc<dyn CatalogService>, playlist: &PlaylistId, delay: Duration) {
    let catalog = Arc::clone(catalog);
    let playlist = playlist.clone();
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = catalog.set_playlist_private(&playlist).await {
            warn!("Failed to make playlist {} private: {}", playlist, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use starshelf_common::catalog::{CatalogOp, MemoryCatalog};
    use starshelf_common::config::StoreConfig;
    use starshelf_common::events::EventBus;
    use starshelf_common::kv::MemoryStore;
    use starshelf_common::settings::load_playlist_uris;

    fn r(s: &str) -> Rating {
        s.parse().unwrap()
    }

    fn filled(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}:{}", prefix, i)).collect()
    }

    fn setup(config: StoreConfig) -> (Arc<MemoryCatalog>, Arc<MemoryStore>, StoreContext, FolderId) {
        let catalog = Arc::new(MemoryCatalog::new());
        let store = Arc::new(MemoryStore::new());
        let folder = catalog.insert_folder("Rated", None);
        let ctx = StoreContext::new(catalog.clone(), store.clone(), EventBus::default(), config);
        (catalog, store, ctx, folder)
    }

    #[tokio::test]
    async fn test_creates_primary_when_unmapped() {
        let (catalog, store, ctx, folder) = setup(StoreConfig::without_delays());
        let mut state = StoreState::default();

        let target = resolve_write_target(&ctx, &mut state, &folder, r("3.5")).await.unwrap();
        assert_eq!(catalog.playlist_named(Some(folder.as_str()), "3.5"), Some(target.clone()));
        assert_eq!(state.mapping.target(r("3.5")), Some(&target));
        assert_eq!(load_playlist_uris(store.as_ref()).unwrap()[&r("3.5")], target);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(catalog.is_private(&target));
    }

    #[tokio::test]
    async fn test_returns_existing_target_with_room() {
        let (catalog, _store, ctx, folder) = setup(StoreConfig::without_delays());
        let existing = catalog.insert_playlist("2.0", Some(folder.as_str()), filled("t", 10));
        let mut state = StoreState::default();
        state.mapping.set_target(r("2.0"), existing.clone(), "2.0".into());

        let target = resolve_write_target(&ctx, &mut state, &folder, r("2.0")).await.unwrap();
        assert_eq!(target, existing);
        assert_eq!(catalog.call_count(CatalogOp::CreatePlaylist), 0);
    }

    #[tokio::test]
    async fn test_full_primary_creates_first_shard() {
        let (catalog, store, ctx, folder) = setup(StoreConfig::without_delays());
        let primary = catalog.insert_playlist("4.0", Some(folder.as_str()), filled("t", 8000));
        let mut state = StoreState::default();
        state.mapping.set_target(r("4.0"), primary.clone(), "4.0".into());

        let target = resolve_write_target(&ctx, &mut state, &folder, r("4.0")).await.unwrap();
        assert_eq!(catalog.playlist_named(Some(folder.as_str()), "4.0(1)"), Some(target.clone()));
        assert_eq!(load_playlist_uris(store.as_ref()).unwrap()[&r("4.0")], target);
        // Primary is still scanned
        assert_eq!(state.mapping.playlists_for(r("4.0")), vec![primary, target]);
    }

    #[tokio::test]
    async fn test_skips_taken_shard_names() {
        let config = StoreConfig {
            shard_capacity: 2,
            ..StoreConfig::without_delays()
        };
        let (catalog, _store, ctx, folder) = setup(config);
        catalog.insert_playlist("1.0", Some(folder.as_str()), filled("a", 2));
        catalog.insert_playlist("1.0(1)", Some(folder.as_str()), filled("b", 2));
        let second = catalog.insert_playlist("1.0(2)", Some(folder.as_str()), filled("c", 2));
        let mut state = StoreState::default();
        state.mapping.set_target(r("1.0"), second, "1.0(2)".into());

        let target = resolve_write_target(&ctx, &mut state, &folder, r("1.0")).await.unwrap();
        assert_eq!(catalog.playlist_named(Some(folder.as_str()), "1.0(3)"), Some(target));
        // (1) and (2) collided before (3) succeeded
        assert_eq!(catalog.call_count(CatalogOp::CreatePlaylist), 3);
    }

    #[tokio::test]
    async fn test_exhausted_shard_names_is_fatal() {
        let config = StoreConfig {
            shard_capacity: 1,
            max_name_attempts: 3,
            ..StoreConfig::without_delays()
        };
        let (catalog, _store, ctx, folder) = setup(config);
        let primary = catalog.insert_playlist("5.0", Some(folder.as_str()), filled("x", 1));
        for n in 1..=3 {
            catalog.insert_playlist(&format!("5.0({})", n), Some(folder.as_str()), Vec::new());
        }
        let mut state = StoreState::default();
        state.mapping.set_target(r("5.0"), primary.clone(), "5.0".into());

        let err = resolve_write_target(&ctx, &mut state, &folder, r("5.0")).await.unwrap_err();
        assert!(matches!(err, Error::ShardNamesExhausted { attempts: 3, .. }));
        assert_eq!(state.mapping.target(r("5.0")), Some(&primary));
    }

    #[tokio::test]
    async fn test_primary_create_failure_propagates() {
        let (catalog, _store, ctx, folder) = setup(StoreConfig::without_delays());
        catalog.set_failing(CatalogOp::CreatePlaylist, true);
        let mut state = StoreState::default();
        let err = resolve_write_target(&ctx, &mut state, &folder, r("0.5")).await.unwrap_err();
        assert!(matches!(err, Error::Service(_)));
        assert!(state.mapping.is_empty());
    }
}
