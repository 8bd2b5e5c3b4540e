//! Rating values and rating-playlist naming
//!
//! A rating is a quantized value in {0.0, 0.5, ..., 5.0}. Internally it is held
//! as a count of half steps so equality and ordering are exact. The canonical
//! string form ("3.5") is used as the persisted mapping key and as the name of
//! the primary rating playlist; overflow shards are named `<rating>(<n>)`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of half steps in the full rating range (5.0 stars)
const MAX_HALF_STEPS: u8 = 10;

/// User-assigned score attached to a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rating(u8);

impl Rating {
    /// Lowest assignable rating (0.0)
    pub const MIN: Rating = Rating(0);

    /// Highest assignable rating (5.0)
    pub const MAX: Rating = Rating(MAX_HALF_STEPS);

    /// Rating assumed for unrated tracks unless configured otherwise (3.0)
    pub const DEFAULT_UNRATED: Rating = Rating(6);

    /// Build a rating from a number of half steps (0..=10)
    pub fn from_half_steps(half_steps: u8) -> Option<Self> {
        (half_steps <= MAX_HALF_STEPS).then_some(Rating(half_steps))
    }

    /// Build a rating from an exact value; rejects values off the 0.5 grid
    pub fn from_value(value: f64) -> Option<Self> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 {
            return None;
        }
        if doubled < 0.0 || doubled > f64::from(MAX_HALF_STEPS) {
            return None;
        }
        Some(Rating(doubled as u8))
    }

    /// Round an arbitrary value to the nearest rating, clamping to the valid range
    pub fn nearest(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        let doubled = (value * 2.0).round().clamp(0.0, f64::from(MAX_HALF_STEPS));
        Some(Rating(doubled as u8))
    }

    /// Number of half steps above 0.0
    pub fn half_steps(self) -> u8 {
        self.0
    }

    /// Numeric value of the rating
    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Not a rating: {:?}", s)))?;
        Rating::from_value(value)
            .ok_or_else(|| Error::InvalidInput(format!("Rating out of range: {:?}", s)))
    }
}

impl TryFrom<String> for Rating {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rating> for String {
    fn from(rating: Rating) -> String {
        rating.to_string()
    }
}

/// Name of overflow shard `n` for a rating, e.g. `"4.0(2)"`
pub fn shard_name(rating: Rating, n: u32) -> String {
    format!("{}({})", rating, n)
}

/// Parsed name of a playlist living under the rated folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPlaylistName {
    pub rating: Rating,
    /// Shard suffix; `None` for the primary playlist
    pub shard: Option<u32>,
}

impl RatingPlaylistName {
    /// Parse `"3.5"` or `"3.5(2)"`. Returns `None` for any other name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        match name.strip_suffix(')').and_then(|rest| rest.split_once('(')) {
            Some((rating, shard)) => {
                let shard: u32 = shard.parse().ok()?;
                if shard == 0 {
                    return None;
                }
                Some(Self {
                    rating: rating.parse().ok()?,
                    shard: Some(shard),
                })
            }
            None => Some(Self {
                rating: name.parse().ok()?,
                shard: None,
            }),
        }
    }

    /// Position in the shard sequence (primary = 0)
    pub fn sequence(&self) -> u32 {
        self.shard.unwrap_or(0)
    }
}

impl fmt::Display for RatingPlaylistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shard {
            Some(n) => write!(f, "{}({})", self.rating, n),
            None => write!(f, "{}", self.rating),
        }
    }
}

/// Numpad digit bound to each canonical rating (Ctrl+Alt+digit)
///
/// 1..9 map to 0.5..4.5 and 0 maps to 5.0.
pub const KEYBOARD_SHORTCUTS: [(char, Rating); 10] = [
    ('1', Rating(1)),
    ('2', Rating(2)),
    ('3', Rating(3)),
    ('4', Rating(4)),
    ('5', Rating(5)),
    ('6', Rating(6)),
    ('7', Rating(7)),
    ('8', Rating(8)),
    ('9', Rating(9)),
    ('0', Rating(10)),
];

/// Rating bound to a numpad digit, if any
pub fn shortcut_rating(key: char) -> Option<Rating> {
    KEYBOARD_SHORTCUTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, rating)| *rating)
}
