//! Shared store context and mutable store state
//!
//! [`StoreContext`] bundles the collaborators every store operation talks to.
//! [`StoreState`] is the single mutable record (rated folder, mapping, index);
//! the session owns it behind one async mutex, so each operation below it
//! receives `&mut StoreState` and is the only writer while it runs.

use crate::index::RatingIndex;
use crate::mapping::PlaylistMapping;
use starshelf_common::config::StoreConfig;
use starshelf_common::events::{EventBus, StarshelfEvent};
use starshelf_common::kv::KeyValueStore;
use starshelf_common::settings;
use starshelf_common::{CatalogService, FolderId};
use std::sync::Arc;

/// Collaborators shared by all store operations
#[derive(Clone)]
pub struct StoreContext {
    pub catalog: Arc<dyn CatalogService>,
    pub store: Arc<dyn KeyValueStore>,
    pub events: EventBus,
    pub config: StoreConfig,
}

impl StoreContext {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        store: Arc<dyn KeyValueStore>,
        events: EventBus,
        config: StoreConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            events,
            config,
        }
    }

    /// Broadcast an event; no listener is fine
    pub fn emit(&self, event: StarshelfEvent) {
        self.events.emit_lossy(event);
    }

    /// Persist the writable part of the mapping
    pub fn save_mapping(&self, mapping: &PlaylistMapping) -> crate::Result<()> {
        settings::save_playlist_uris(self.store.as_ref(), mapping.targets())?;
        Ok(())
    }

    pub fn save_rated_folder(&self, folder: Option<&FolderId>) -> crate::Result<()> {
        settings::save_rated_folder(self.store.as_ref(), folder)?;
        Ok(())
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("config", &self.config)
            .field("subscribers", &self.events.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// Mutable rating store state
#[derive(Debug, Default)]
pub struct StoreState {
    pub rated_folder: Option<FolderId>,
    pub mapping: PlaylistMapping,
    pub index: RatingIndex,
}

impl StoreState {
    /// Forget everything (rated folder vanished or was reassigned)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
