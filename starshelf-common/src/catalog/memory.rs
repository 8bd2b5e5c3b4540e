//! In-memory catalog backend
//!
//! A self-contained [`CatalogService`] holding folders, playlists, track
//! metadata, albums and the liked collection in process memory. It keeps the
//! service contract (name collisions on create, folder tree listing, ordered
//! playlists) and adds failure injection plus a call log so callers can observe
//! how the store drives the service.

use super::{
    CatalogService, FolderContents, FolderId, FolderNode, PlaylistId, PlaylistNode, ServiceError,
    ServiceResult, TrackId, TrackMetadata,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Catalog operations, used for failure injection and call accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    CreatePlaylist,
    SetPlaylistPrivate,
    CreateFolder,
    ListFolderContents,
    GetPlaylistTracks,
    GetPlaylistName,
    AddTracks,
    RemoveTrack,
    ReorderTracks,
    GetTrackMetadata,
    SearchByRecordingCode,
    GetAlbumTracks,
    GetLikedTracks,
    GetLikedState,
    SetLiked,
}

#[derive(Debug)]
struct StoredFolder {
    id: FolderId,
    name: String,
    parent: Option<FolderId>,
}

#[derive(Debug)]
struct StoredPlaylist {
    id: PlaylistId,
    name: String,
    parent: Option<FolderId>,
    tracks: Vec<TrackId>,
    private: bool,
}

#[derive(Debug, Default)]
struct CatalogState {
    /// Creation order is listing order
    folders: Vec<StoredFolder>,
    playlists: Vec<StoredPlaylist>,
    tracks: HashMap<TrackId, TrackMetadata>,
    albums: HashMap<String, Vec<TrackId>>,
    liked: Vec<TrackId>,
    failing_ops: HashSet<CatalogOp>,
    failing_tracks: HashSet<TrackId>,
    calls: Vec<CatalogOp>,
    /// (playlist, batch length) for every add_tracks call
    add_batches: Vec<(PlaylistId, usize)>,
}

impl CatalogState {
    fn check(&mut self, op: CatalogOp) -> ServiceResult<()> {
        self.calls.push(op);
        if self.failing_ops.contains(&op) {
            return Err(ServiceError::Backend(format!("injected failure: {:?}", op)));
        }
        Ok(())
    }

    fn check_track(&self, track: &TrackId) -> ServiceResult<()> {
        if self.failing_tracks.contains(track) {
            return Err(ServiceError::Backend(format!("injected failure for {}", track)));
        }
        Ok(())
    }

    fn playlist(&self, id: &str) -> ServiceResult<&StoredPlaylist> {
        self.playlists
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    fn playlist_mut(&mut self, id: &str) -> ServiceResult<&mut StoredPlaylist> {
        self.playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    fn folder_exists(&self, id: &str) -> bool {
        self.folders.iter().any(|f| f.id == id)
    }

    fn contents_of(&self, parent: Option<&str>) -> FolderContents {
        let folders = self
            .folders
            .iter()
            .filter(|f| f.parent.as_deref() == parent)
            .map(|f| FolderNode {
                id: f.id.clone(),
                name: f.name.clone(),
                contents: self.contents_of(Some(&f.id)),
            })
            .collect();
        let playlists = self
            .playlists
            .iter()
            .filter(|p| p.parent.as_deref() == parent)
            .map(|p| PlaylistNode {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect();
        FolderContents { folders, playlists }
    }

    fn push_playlist(&mut self, name: &str, parent: Option<&str>, tracks: Vec<TrackId>) -> PlaylistId {
        let id = format!("playlist:{}", Uuid::new_v4().simple());
        self.playlists.push(StoredPlaylist {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
            tracks,
            private: false,
        });
        id
    }

    fn push_folder(&mut self, name: &str, parent: Option<&str>) -> FolderId {
        let id = format!("folder:{}", Uuid::new_v4().simple());
        self.folders.push(StoredFolder {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
        });
        id
    }
}

/// Process-local catalog backend
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register track metadata
    pub fn insert_track(&self, track: &str, name: &str, recording_code: Option<&str>) {
        self.state().tracks.insert(
            track.to_string(),
            TrackMetadata {
                track_id: track.to_string(),
                name: Some(name.to_string()),
                unique_recording_code: recording_code.map(str::to_string),
            },
        );
    }

    /// Register an album and its track list
    pub fn insert_album(&self, album: &str, tracks: &[&str]) {
        self.state()
            .albums
            .insert(album.to_string(), tracks.iter().map(|t| t.to_string()).collect());
    }

    /// Create a folder directly (no service call recorded)
    pub fn insert_folder(&self, name: &str, parent: Option<&str>) -> FolderId {
        self.state().push_folder(name, parent)
    }

    /// Create a playlist directly with the given contents (no collision check)
    pub fn insert_playlist(&self, name: &str, parent: Option<&str>, tracks: Vec<TrackId>) -> PlaylistId {
        self.state().push_playlist(name, parent, tracks)
    }

    /// Mark tracks as liked directly
    pub fn insert_liked(&self, tracks: &[&str]) {
        let mut state = self.state();
        for track in tracks {
            if !state.liked.iter().any(|t| t == track) {
                state.liked.push(track.to_string());
            }
        }
    }

    /// Move a playlist to another folder (`None` = root), as a user would outside the store
    pub fn move_playlist(&self, playlist: &str, parent: Option<&str>) {
        if let Ok(p) = self.state().playlist_mut(playlist) {
            p.parent = parent.map(str::to_string);
        }
    }

    /// Delete a folder together with every playlist directly inside it
    pub fn delete_folder(&self, folder: &str) {
        let mut state = self.state();
        state.folders.retain(|f| f.id != folder);
        state.playlists.retain(|p| p.parent.as_deref() != Some(folder));
    }

    /// Current contents of a playlist (empty if unknown)
    pub fn playlist_tracks(&self, playlist: &str) -> Vec<TrackId> {
        self.state()
            .playlist(playlist)
            .map(|p| p.tracks.clone())
            .unwrap_or_default()
    }

    /// Identifier of the playlist with this name under `parent`
    pub fn playlist_named(&self, parent: Option<&str>, name: &str) -> Option<PlaylistId> {
        self.state()
            .playlists
            .iter()
            .find(|p| p.parent.as_deref() == parent && p.name == name)
            .map(|p| p.id.clone())
    }

    /// Number of playlists directly under `parent`
    pub fn playlist_count(&self, parent: Option<&str>) -> usize {
        self.state()
            .playlists
            .iter()
            .filter(|p| p.parent.as_deref() == parent)
            .count()
    }

    pub fn is_private(&self, playlist: &str) -> bool {
        self.state().playlist(playlist).map(|p| p.private).unwrap_or(false)
    }

    pub fn is_liked(&self, track: &str) -> bool {
        self.state().liked.iter().any(|t| t == track)
    }

    /// Make every call of `op` fail (or stop failing)
    pub fn set_failing(&self, op: CatalogOp, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing_ops.insert(op);
        } else {
            state.failing_ops.remove(&op);
        }
    }

    /// Make every playlist mutation involving `track` fail
    pub fn fail_track(&self, track: &str) {
        self.state().failing_tracks.insert(track.to_string());
    }

    /// How many times `op` was called
    pub fn call_count(&self, op: CatalogOp) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    /// Batch sizes of every add_tracks call against `playlist`
    pub fn add_batch_sizes(&self, playlist: &str) -> Vec<usize> {
        self.state()
            .add_batches
            .iter()
            .filter(|(p, _)| p == playlist)
            .map(|(_, n)| *n)
            .collect()
    }
}

#[async_trait]
impl CatalogService for MemoryCatalog {
    async fn create_playlist(&self, name: &str, parent: &FolderId) -> ServiceResult<PlaylistId> {
        let mut state = self.state();
        state.check(CatalogOp::CreatePlaylist)?;
        if !state.folder_exists(parent) {
            return Err(ServiceError::NotFound(parent.clone()));
        }
        let collision = state
            .playlists
            .iter()
            .any(|p| p.parent.as_deref() == Some(parent.as_str()) && p.name == name);
        if collision {
            return Err(ServiceError::NameCollision(name.to_string()));
        }
        Ok(state.push_playlist(name, Some(parent), Vec::new()))
    }

    async fn set_playlist_private(&self, playlist: &PlaylistId) -> ServiceResult<()> {
        let mut state = self.state();
        state.check(CatalogOp::SetPlaylistPrivate)?;
        state.playlist_mut(playlist)?.private = true;
        Ok(())
    }

    async fn create_folder(&self, name: &str) -> ServiceResult<FolderId> {
        let mut state = self.state();
        state.check(CatalogOp::CreateFolder)?;
        Ok(state.push_folder(name, None))
    }

    async fn list_folder_contents(&self, folder: Option<&FolderId>) -> ServiceResult<FolderContents> {
        let mut state = self.state();
        state.check(CatalogOp::ListFolderContents)?;
        match folder {
            Some(id) if !state.folder_exists(id) => Err(ServiceError::NotFound(id.clone())),
            Some(id) => Ok(state.contents_of(Some(id))),
            None => Ok(state.contents_of(None)),
        }
    }

    async fn get_playlist_tracks(&self, playlist: &PlaylistId) -> ServiceResult<Vec<TrackId>> {
        let mut state = self.state();
        state.check(CatalogOp::GetPlaylistTracks)?;
        Ok(state.playlist(playlist)?.tracks.clone())
    }

    async fn get_playlist_name(&self, playlist: &PlaylistId) -> ServiceResult<String> {
        let mut state = self.state();
        state.check(CatalogOp::GetPlaylistName)?;
        Ok(state.playlist(playlist)?.name.clone())
    }

    async fn add_tracks(&self, playlist: &PlaylistId, tracks: &[TrackId]) -> ServiceResult<()> {
        let mut state = self.state();
        state.check(CatalogOp::AddTracks)?;
        for track in tracks {
            state.check_track(track)?;
        }
        state.playlist_mut(playlist)?.tracks.extend(tracks.iter().cloned());
        state.add_batches.push((playlist.clone(), tracks.len()));
        Ok(())
    }

    async fn remove_track(&self, playlist: &PlaylistId, track: &TrackId) -> ServiceResult<()> {
        let mut state = self.state();
        state.check(CatalogOp::RemoveTrack)?;
        state.check_track(track)?;
        state.playlist_mut(playlist)?.tracks.retain(|t| t != track);
        Ok(())
    }

    async fn reorder_tracks(&self, playlist: &PlaylistId, ordered: &[TrackId]) -> ServiceResult<()> {
        let mut state = self.state();
        state.check(CatalogOp::ReorderTracks)?;
        let stored = state.playlist_mut(playlist)?;
        let mut current = stored.tracks.clone();
        let mut proposed = ordered.to_vec();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(ServiceError::Backend(format!(
                "reorder of {} is not a permutation of its tracks",
                playlist
            )));
        }
        stored.tracks = ordered.to_vec();
        Ok(())
    }

    async fn get_track_metadata(&self, track: &TrackId) -> ServiceResult<TrackMetadata> {
        let mut state = self.state();
        state.check(CatalogOp::GetTrackMetadata)?;
        state
            .tracks
            .get(track)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(track.clone()))
    }

    async fn search_tracks_by_recording_code(&self, code: &str) -> ServiceResult<Vec<TrackId>> {
        let mut state = self.state();
        state.check(CatalogOp::SearchByRecordingCode)?;
        let mut found: Vec<TrackId> = state
            .tracks
            .values()
            .filter(|meta| meta.unique_recording_code.as_deref() == Some(code))
            .map(|meta| meta.track_id.clone())
            .collect();
        found.sort();
        Ok(found)
    }

    async fn get_album_tracks(&self, album: &str) -> ServiceResult<Vec<TrackId>> {
        let mut state = self.state();
        state.check(CatalogOp::GetAlbumTracks)?;
        state
            .albums
            .get(album)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(album.to_string()))
    }

    async fn get_liked_tracks(&self) -> ServiceResult<Vec<TrackId>> {
        let mut state = self.state();
        state.check(CatalogOp::GetLikedTracks)?;
        Ok(state.liked.clone())
    }

    async fn get_liked_state(&self, track: &TrackId) -> ServiceResult<bool> {
        let mut state = self.state();
        state.check(CatalogOp::GetLikedState)?;
        Ok(state.liked.iter().any(|t| t == track))
    }

    async fn set_liked(&self, track: &TrackId, liked: bool) -> ServiceResult<()> {
        let mut state = self.state();
        state.check(CatalogOp::SetLiked)?;
        let present = state.liked.iter().any(|t| t == track);
        if liked && !present {
            state.liked.push(track.clone());
        } else if !liked {
            state.liked.retain(|t| t != track);
        }
        Ok(())
    }
}
