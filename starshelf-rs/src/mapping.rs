//! Rating Playlist Mapping
//!
//! Rating → playlist map that is persisted between sessions. The persisted
//! value for a rating always names the *current writable* playlist for that
//! rating: the primary playlist at first, then the newest overflow shard.
//! Alongside it, the mapping remembers every rating playlist discovered in the
//! rated folder (primary and shards) so index scans and removals can reach
//! tracks placed in earlier, full shards.

use starshelf_common::catalog::PlaylistNode;
use starshelf_common::rating::RatingPlaylistName;
use starshelf_common::{PlaylistId, Rating};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Result of reconciling the mapping against the rated folder's children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileDiff {
    /// Entries dropped because their playlist is no longer in the folder
    pub removed: Vec<(Rating, PlaylistId)>,
    /// Entries added for ratings that had no mapping yet
    pub added: Vec<(Rating, PlaylistId)>,
}

impl ReconcileDiff {
    /// Whether the persisted mapping must be rewritten
    pub fn changed(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty()
    }
}

/// Rating → playlist mapping plus every known shard
#[derive(Debug, Clone, Default)]
pub struct PlaylistMapping {
    /// Persisted part: current writable playlist per rating
    targets: BTreeMap<Rating, PlaylistId>,
    /// Every rating playlist per rating, ordered by shard sequence (primary = 0)
    shards: BTreeMap<Rating, BTreeMap<u32, PlaylistId>>,
    /// Display names of known rating playlists
    names: HashMap<PlaylistId, String>,
}

impl PlaylistMapping {
    /// Start from the persisted rating → playlist map
    pub fn from_targets(targets: BTreeMap<Rating, PlaylistId>) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    /// Persisted part of the mapping
    pub fn targets(&self) -> &BTreeMap<Rating, PlaylistId> {
        &self.targets
    }

    /// Current writable playlist for a rating
    pub fn target(&self, rating: Rating) -> Option<&PlaylistId> {
        self.targets.get(&rating)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Record a newly created playlist as the writable target for its rating
    pub fn set_target(&mut self, rating: Rating, playlist: PlaylistId, name: String) {
        let sequence = RatingPlaylistName::parse(&name)
            .filter(|parsed| parsed.rating == rating)
            .map(|parsed| parsed.sequence())
            .unwrap_or_else(|| self.next_free_sequence(rating));
        self.shards
            .entry(rating)
            .or_default()
            .insert(sequence, playlist.clone());
        self.names.insert(playlist.clone(), name);
        self.targets.insert(rating, playlist);
    }

    fn next_free_sequence(&self, rating: Rating) -> u32 {
        self.shards
            .get(&rating)
            .and_then(|s| s.keys().next_back())
            .map(|last| last + 1)
            .unwrap_or(0)
    }

    /// Display name of a rating playlist (falls back to the identifier)
    pub fn name_of(&self, playlist: &str) -> String {
        self.names
            .get(playlist)
            .cloned()
            .unwrap_or_else(|| playlist.to_string())
    }

    /// Every playlist holding tracks of `rating`, primary first
    pub fn playlists_for(&self, rating: Rating) -> Vec<PlaylistId> {
        let mut playlists: Vec<PlaylistId> = self
            .shards
            .get(&rating)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default();
        if let Some(target) = self.targets.get(&rating) {
            if !playlists.contains(target) {
                playlists.push(target.clone());
            }
        }
        playlists
    }

    /// Scan order for building the index: ascending rating, then shard sequence
    pub fn scan_order(&self) -> Vec<(Rating, PlaylistId)> {
        let ratings: BTreeMap<Rating, ()> = self
            .targets
            .keys()
            .chain(self.shards.keys())
            .map(|r| (*r, ()))
            .collect();
        ratings
            .keys()
            .flat_map(|rating| {
                self.playlists_for(*rating)
                    .into_iter()
                    .map(move |playlist| (*rating, playlist))
            })
            .collect()
    }

    /// Number of distinct rating playlists known
    pub fn playlist_count(&self) -> usize {
        self.scan_order().len()
    }

    /// Reconcile against the rated folder's direct child playlists
    ///
    /// Entries whose playlist is no longer a child are removed. Children named
    /// like rating playlists are (re)registered as shards; a rating without an
    /// entry gets its highest-numbered shard as the writable target.
    pub fn reconcile(&mut self, children: &[PlaylistNode]) -> ReconcileDiff {
        let mut diff = ReconcileDiff::default();
        let child_ids: HashSet<&str> = children.iter().map(|c| c.id.as_str()).collect();

        self.targets.retain(|rating, playlist| {
            let keep = child_ids.contains(playlist.as_str());
            if !keep {
                info!("Dropping mapping {} → {} (no longer in rated folder)", rating, playlist);
                diff.removed.push((*rating, playlist.clone()));
            }
            keep
        });

        self.shards.clear();
        self.names.clear();
        for child in children {
            self.names.insert(child.id.clone(), child.name.clone());
            match RatingPlaylistName::parse(&child.name) {
                Some(parsed) => {
                    self.shards
                        .entry(parsed.rating)
                        .or_default()
                        .insert(parsed.sequence(), child.id.clone());
                }
                None => debug!("Ignoring non-rating playlist {:?} in rated folder", child.name),
            }
        }

        for (rating, shards) in &self.shards {
            if self.targets.contains_key(rating) {
                continue;
            }
            if let Some(newest) = shards.values().next_back() {
                info!("Adding mapping {} → {} (found in rated folder)", rating, newest);
                self.targets.insert(*rating, newest.clone());
                diff.added.push((*rating, newest.clone()));
            }
        }

        diff
    }
}
