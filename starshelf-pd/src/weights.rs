//! Weight model: rating → selection weight

use crate::sampler::Candidate;
use starshelf_common::{Rating, TrackId};
use std::collections::HashMap;

/// Weight of a track: its rating's value, or the default rating's if unrated
///
/// A 0.0 rating gives weight 0, which excludes the track from every draw.
pub fn weight_for(rating: Option<Rating>, default_rating: Rating) -> f64 {
    rating.unwrap_or(default_rating).value()
}

/// Weighted candidates for `tracks`, in input order
pub fn weigh<'a, I>(tracks: I, ratings: &HashMap<TrackId, Rating>, default_rating: Rating) -> Vec<Candidate<TrackId>>
where
    I: IntoIterator<Item = &'a TrackId>,
{
    tracks
        .into_iter()
        .map(|track| Candidate {
            id: track.clone(),
            weight: weight_for(ratings.get(track).copied(), default_rating),
        })
        .collect()
}
