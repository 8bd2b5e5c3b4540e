//! Rating Index
//!
//! In-memory mapping from track to its rating and the rating playlist that
//! currently holds it. Built by scanning every rating playlist, then patched
//! in place by rating changes; only a rated-folder (re)load rebuilds it.

use starshelf_common::{PlaylistId, Rating, TrackId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Where a rated track lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatedEntry {
    pub rating: Rating,
    /// Rating playlist (primary or shard) containing the track
    pub playlist: PlaylistId,
}

/// Track seen in more than one rating playlist during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictingEntry {
    pub track_id: TrackId,
    pub discarded: RatedEntry,
    pub kept: RatedEntry,
}

/// Track → rating map; at most one rating per track
#[derive(Debug, Default, Clone)]
pub struct RatingIndex {
    entries: HashMap<TrackId, RatedEntry>,
}

impl RatingIndex {
    /// Build from playlist scans, in scan order
    ///
    /// A track found in several rating playlists keeps the last one scanned;
    /// every such conflict is returned so the caller can report it.
    pub fn from_scans<I>(scans: I) -> (Self, Vec<ConflictingEntry>)
    where
        I: IntoIterator<Item = (Rating, PlaylistId, Vec<TrackId>)>,
    {
        let mut index = Self::default();
        let mut conflicts = Vec::new();

        for (rating, playlist, tracks) in scans {
            for track in tracks {
                let entry = RatedEntry {
                    rating,
                    playlist: playlist.clone(),
                };
                if let Some(previous) = index.entries.insert(track.clone(), entry.clone()) {
                    if previous != entry {
                        warn!(
                            "Track {} found in both {} ({}) and {} ({}); keeping the latter",
                            track, previous.playlist, previous.rating, entry.playlist, entry.rating
                        );
                        conflicts.push(ConflictingEntry {
                            track_id: track,
                            discarded: previous,
                            kept: entry,
                        });
                    }
                }
            }
        }

        (index, conflicts)
    }

    pub fn get(&self, track: &str) -> Option<&RatedEntry> {
        self.entries.get(track)
    }

    pub fn rating(&self, track: &str) -> Option<Rating> {
        self.entries.get(track).map(|e| e.rating)
    }

    /// Record a track's placement, returning the previous one
    pub fn insert(&mut self, track: TrackId, rating: Rating, playlist: PlaylistId) -> Option<RatedEntry> {
        self.entries.insert(track, RatedEntry { rating, playlist })
    }

    pub fn remove(&mut self, track: &str) -> Option<RatedEntry> {
        self.entries.remove(track)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackId, &RatedEntry)> {
        self.entries.iter()
    }

    /// Plain track → rating copy, for weighting outside the session lock
    pub fn ratings(&self) -> HashMap<TrackId, Rating> {
        self.entries
            .iter()
            .map(|(track, entry)| (track.clone(), entry.rating))
            .collect()
    }

    /// Number of tracks currently carrying `rating`
    pub fn count_with(&self, rating: Rating) -> usize {
        self.entries.values().filter(|e| e.rating == rating).count()
    }
}
