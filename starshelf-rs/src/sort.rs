//! Sort a playlist by rating
//!
//! Highest rating first, unrated tracks last, original order kept among
//! equals. While a sort runs, rating clicks are ignored.

use crate::error::Result;
use crate::session::RatingSession;
use starshelf_common::events::StarshelfEvent;
use starshelf_common::{PlaylistId, Rating, TrackId};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOutcome {
    /// Another sort was already running
    AlreadySorting,
    /// Ratings were being reloaded; sorting now would use a partial index
    Loading,
    /// The playlist was already in rating order
    Unchanged,
    Reordered,
}

/// Stable rating order: descending, unrated last
pub fn order_by_rating(tracks: &[TrackId], ratings: &HashMap<TrackId, Rating>) -> Vec<TrackId> {
    let mut ordered = tracks.to_vec();
    ordered.sort_by_key(|track| Reverse(ratings.get(track).map(|r| i16::from(r.half_steps())).unwrap_or(-1)));
    ordered
}

impl RatingSession {
    /// Reorder `playlist` by rating
    pub async fn sort_playlist_by_rating(&self, playlist: &PlaylistId) -> Result<SortOutcome> {
        if self.is_loading() {
            debug!("Sort of {} requested while ratings load", playlist);
            return Ok(SortOutcome::Loading);
        }
        let Some(_sorting) = self.begin_sort() else {
            debug!("Sort of {} requested while another sort runs", playlist);
            return Ok(SortOutcome::AlreadySorting);
        };
        self.context().emit(StarshelfEvent::notice("Sorting..."));

        let catalog = &self.context().catalog;
        let tracks = catalog.get_playlist_tracks(playlist).await?;
        let ratings = self.ratings_snapshot().await;
        let ordered = order_by_rating(&tracks, &ratings);
        let outcome = if ordered == tracks {
            SortOutcome::Unchanged
        } else {
            catalog.reorder_tracks(playlist, &ordered).await?;
            info!("Sorted {} ({} tracks) by rating", playlist, ordered.len());
            SortOutcome::Reordered
        };

        self.context().emit(StarshelfEvent::notice("Sorted by rating"));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<TrackId> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_descending_with_unrated_last() {
        let mut ratings = HashMap::new();
        ratings.insert("a".to_string(), "2.0".parse().unwrap());
        ratings.insert("b".to_string(), "5.0".parse().unwrap());
        ratings.insert("d".to_string(), "0.0".parse().unwrap());
        ratings.insert("e".to_string(), "2.0".parse().unwrap());

        let ordered = order_by_rating(&ids(&["a", "c", "b", "d", "e", "f"]), &ratings);
        // Rated 0.0 still sorts ahead of unrated; a/e keep their order
        assert_eq!(ordered, ids(&["b", "a", "e", "d", "c", "f"]));
    }
}
