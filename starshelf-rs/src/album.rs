//! Album rating
//!
//! An album's displayed rating is the mean of its rated tracks, rounded to
//! the nearest half step. Unrated tracks do not count.

use crate::error::Result;
use crate::session::RatingSession;
use starshelf_common::Rating;

/// Mean of the rated entries, on the half-step grid
pub fn album_rating<I>(ratings: I) -> Option<Rating>
where
    I: IntoIterator<Item = Option<Rating>>,
{
    let (sum, count) = ratings
        .into_iter()
        .flatten()
        .fold((0.0, 0u32), |(sum, count), rating| (sum + rating.value(), count + 1));
    if count == 0 {
        return None;
    }
    Rating::nearest(sum / f64::from(count))
}

impl RatingSession {
    /// Displayed rating of an album, from the catalog's track list
    pub async fn album_rating(&self, album: &str) -> Result<Option<Rating>> {
        let tracks = self.context().catalog.get_album_tracks(album).await?;
        let ratings = self.ratings_snapshot().await;
        Ok(album_rating(tracks.iter().map(|track| ratings.get(track).copied())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> Option<Rating> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_mean_ignores_unrated() {
        assert_eq!(album_rating(vec![r("4.0"), None, r("5.0"), None]), r("4.5"));
    }

    #[test]
    fn test_rounds_to_half_step() {
        // 3.0, 3.0, 4.0 → 3.33 → 3.5
        assert_eq!(album_rating(vec![r("3.0"), r("3.0"), r("4.0")]), r("3.5"));
        // 1.0, 1.0, 1.0, 1.5 → 1.125 → 1.0
        assert_eq!(album_rating(vec![r("1.0"), r("1.0"), r("1.0"), r("1.5")]), r("1.0"));
    }

    #[test]
    fn test_no_rated_tracks() {
        assert_eq!(album_rating(Vec::new()), None);
        assert_eq!(album_rating(vec![None, None]), None);
        assert_eq!(album_rating(vec![r("0.0")]), r("0.0"));
    }
}
