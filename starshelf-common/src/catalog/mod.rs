//! Catalog/playlist service interface
//!
//! The rating store never owns playlists or tracks: it orchestrates an external
//! service that does. Everything the store needs from that service goes through
//! [`CatalogService`]; any substitute backend must keep the semantics documented
//! on each method (in particular the name-collision failure of
//! [`CatalogService::create_playlist`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;

pub use memory::{CatalogOp, MemoryCatalog};

/// Opaque identifier of a playable item, stable across sessions
pub type TrackId = String;

/// Opaque identifier of a playlist
pub type PlaylistId = String;

/// Opaque identifier of a folder
pub type FolderId = String;

/// Result type for external service calls
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failures reported by the external catalog or player
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A playlist with the same name already exists under the parent folder
    #[error("Name already in use: {0}")]
    NameCollision(String),

    /// Referenced playlist, folder, album or track does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request refused by the service's rate limiter
    #[error("Rate limited")]
    RateLimited,

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Playlist entry inside a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistNode {
    pub id: PlaylistId,
    pub name: String,
}

/// Folder entry inside a folder listing, with its own contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub id: FolderId,
    pub name: String,
    pub contents: FolderContents,
}

/// Tree of folders and playlists under one folder (or the library root)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContents {
    pub folders: Vec<FolderNode>,
    pub playlists: Vec<PlaylistNode>,
}

impl FolderContents {
    /// Depth-first search for a folder by identifier
    pub fn find_folder_by_id(&self, id: &str) -> Option<&FolderNode> {
        self.find_folder(&|folder: &FolderNode| folder.id == id)
    }

    /// Depth-first search for the first folder with the given name
    pub fn find_folder_by_name(&self, name: &str) -> Option<&FolderNode> {
        self.find_folder(&|folder: &FolderNode| folder.name == name)
    }

    fn find_folder(&self, predicate: &dyn Fn(&FolderNode) -> bool) -> Option<&FolderNode> {
        for folder in &self.folders {
            if predicate(folder) {
                return Some(folder);
            }
            if let Some(found) = folder.contents.find_folder(predicate) {
                return Some(found);
            }
        }
        None
    }
}

/// Catalog metadata for a single track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub track_id: TrackId,
    pub name: Option<String>,
    /// Cross-release recording identifier (ISRC)
    pub unique_recording_code: Option<String>,
}

/// Remote catalog and playlist service
///
/// Each call is individually atomic on the service side; nothing here is
/// transactional across calls.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Create a playlist under `parent`.
    ///
    /// Fails with [`ServiceError::NameCollision`] if a playlist with exactly
    /// this name already exists under the parent.
    async fn create_playlist(&self, name: &str, parent: &FolderId) -> ServiceResult<PlaylistId>;

    /// Restrict a playlist's visibility to its owner
    async fn set_playlist_private(&self, playlist: &PlaylistId) -> ServiceResult<()>;

    /// Create a folder at the library root
    async fn create_folder(&self, name: &str) -> ServiceResult<FolderId>;

    /// List a folder's contents; `None` lists the library root
    async fn list_folder_contents(&self, folder: Option<&FolderId>) -> ServiceResult<FolderContents>;

    /// Ordered track list of a playlist (its length is the capacity measure)
    async fn get_playlist_tracks(&self, playlist: &PlaylistId) -> ServiceResult<Vec<TrackId>>;

    /// Display name of a playlist
    async fn get_playlist_name(&self, playlist: &PlaylistId) -> ServiceResult<String>;

    /// Append tracks to a playlist
    async fn add_tracks(&self, playlist: &PlaylistId, tracks: &[TrackId]) -> ServiceResult<()>;

    /// Remove a track from a playlist
    async fn remove_track(&self, playlist: &PlaylistId, track: &TrackId) -> ServiceResult<()>;

    /// Rewrite a playlist's order; `ordered` is a permutation of its tracks
    async fn reorder_tracks(&self, playlist: &PlaylistId, ordered: &[TrackId]) -> ServiceResult<()>;

    async fn get_track_metadata(&self, track: &TrackId) -> ServiceResult<TrackMetadata>;

    /// Every catalog track carrying the given unique recording code
    async fn search_tracks_by_recording_code(&self, code: &str) -> ServiceResult<Vec<TrackId>>;

    async fn get_album_tracks(&self, album: &str) -> ServiceResult<Vec<TrackId>>;

    /// Tracks in the user's liked (saved-tracks) collection
    async fn get_liked_tracks(&self) -> ServiceResult<Vec<TrackId>>;

    async fn get_liked_state(&self, track: &TrackId) -> ServiceResult<bool>;

    async fn set_liked(&self, track: &TrackId, liked: bool) -> ServiceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(id: &str, name: &str) -> PlaylistNode {
        PlaylistNode {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn sample_tree() -> FolderContents {
        FolderContents {
            folders: vec![FolderNode {
                id: "folder:a".to_string(),
                name: "Mixes".to_string(),
                contents: FolderContents {
                    folders: vec![FolderNode {
                        id: "folder:b".to_string(),
                        name: "Rated".to_string(),
                        contents: FolderContents {
                            folders: vec![],
                            playlists: vec![playlist("pl:1", "4.0")],
                        },
                    }],
                    playlists: vec![],
                },
            }],
            playlists: vec![playlist("pl:2", "Road trip")],
        }
    }

    #[test]
    fn test_find_nested_folder_by_id() {
        let tree = sample_tree();
        let found = tree.find_folder_by_id("folder:b").unwrap();
        assert_eq!(found.name, "Rated");
        assert_eq!(found.contents.playlists[0].id, "pl:1");
        assert!(tree.find_folder_by_id("folder:zzz").is_none());
    }

    #[test]
    fn test_find_folder_by_name() {
        let tree = sample_tree();
        assert_eq!(tree.find_folder_by_name("Rated").unwrap().id, "folder:b");
        assert_eq!(tree.find_folder_by_name("Mixes").unwrap().id, "folder:a");
        assert!(tree.find_folder_by_name("Road trip").is_none());
    }
}
