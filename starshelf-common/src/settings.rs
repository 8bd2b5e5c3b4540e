//! User settings and persisted store state
//!
//! Read/write persisted values through a [`KeyValueStore`]. Missing values are
//! replaced by defaults and written back, so the stored object is always
//! complete after the first load.

use crate::catalog::{FolderId, PlaylistId};
use crate::error::Result;
use crate::kv::KeyValueStore;
use crate::rating::Rating;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Key holding the rated folder identifier
pub const RATED_FOLDER_KEY: &str = "rated_folder_uri";

/// Key holding the rating → playlist mapping (JSON object)
pub const PLAYLIST_URIS_KEY: &str = "playlist_uris";

/// Key holding the user settings (JSON object)
pub const SETTINGS_KEY: &str = "settings";

/// Where the now-playing star widget is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarsPosition {
    Left,
    #[default]
    Right,
}

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rating assumed for unrated tracks when weighting
    pub default_rating: Rating,

    /// Ratings at or above this are also added to the liked collection (`None` = disabled)
    pub like_threshold: Option<Rating>,

    /// Tracks rated at or below this are skipped on playback (`None` = disabled)
    pub skip_threshold: Option<Rating>,

    /// Propagate rating changes to other releases of the same recording
    pub sync_duplicate_songs: bool,

    pub half_star_ratings: bool,

    pub show_playlist_stars: bool,

    pub now_playing_stars_position: StarsPosition,

    pub enable_keyboard_shortcuts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_rating: Rating::DEFAULT_UNRATED,
            like_threshold: None,
            skip_threshold: None,
            sync_duplicate_songs: false,
            half_star_ratings: true,
            show_playlist_stars: true,
            now_playing_stars_position: StarsPosition::Right,
            enable_keyboard_shortcuts: false,
        }
    }
}

/// Read and decode a JSON value
///
/// Returns `Ok(None)` when the key is absent.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    store.set(key, &serde_json::to_string(value)?)
}

/// Load user settings, filling defaults and writing the result back
///
/// An undecodable settings object is replaced by defaults rather than failing
/// startup.
pub fn load_settings(store: &dyn KeyValueStore) -> Result<Settings> {
    let settings = match get_json::<Settings>(store, SETTINGS_KEY) {
        Ok(Some(settings)) => settings,
        Ok(None) => Settings::default(),
        Err(e) => {
            warn!("Discarding unreadable settings: {}", e);
            Settings::default()
        }
    };
    save_settings(store, &settings)?;
    Ok(settings)
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &Settings) -> Result<()> {
    set_json(store, SETTINGS_KEY, settings)
}

/// Load the rated folder identifier (an empty value means none)
pub fn load_rated_folder(store: &dyn KeyValueStore) -> Result<Option<FolderId>> {
    Ok(store.get(RATED_FOLDER_KEY)?.filter(|id| !id.is_empty()))
}

/// Persist the rated folder identifier; `None` clears it
pub fn save_rated_folder(store: &dyn KeyValueStore, folder: Option<&FolderId>) -> Result<()> {
    store.set(RATED_FOLDER_KEY, folder.map(String::as_str).unwrap_or(""))
}

/// Load the rating → playlist mapping
///
/// Entries whose key is not a canonical rating are dropped with a warning.
pub fn load_playlist_uris(store: &dyn KeyValueStore) -> Result<BTreeMap<Rating, PlaylistId>> {
    let raw = match get_json::<BTreeMap<String, PlaylistId>>(store, PLAYLIST_URIS_KEY) {
        Ok(raw) => raw.unwrap_or_default(),
        Err(e) => {
            warn!("Discarding unreadable playlist mapping: {}", e);
            BTreeMap::new()
        }
    };

    let mut mapping = BTreeMap::new();
    for (key, playlist) in raw {
        match key.parse::<Rating>() {
            Ok(rating) => {
                mapping.insert(rating, playlist);
            }
            Err(e) => warn!("Ignoring playlist mapping entry {:?}: {}", key, e),
        }
    }
    Ok(mapping)
}

pub fn save_playlist_uris(
    store: &dyn KeyValueStore,
    mapping: &BTreeMap<Rating, PlaylistId>,
) -> Result<()> {
    set_json(store, PLAYLIST_URIS_KEY, mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[test]
    fn test_settings_defaults_written_back() {
        let store = MemoryStore::new();
        let settings = load_settings(&store).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_rating.to_string(), "3.0");
        assert!(store.get(SETTINGS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_settings_partial_object_filled() {
        let store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"like_threshold":"4.0","sync_duplicate_songs":true}"#)
            .unwrap();
        let settings = load_settings(&store).unwrap();
        assert_eq!(settings.like_threshold.unwrap().to_string(), "4.0");
        assert!(settings.sync_duplicate_songs);
        assert_eq!(settings.skip_threshold, None);
        assert!(settings.show_playlist_stars);

        // Written back complete
        let raw = store.get(SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("default_rating"));
    }

    #[test]
    fn test_settings_corrupt_object_replaced() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, "not json").unwrap();
        assert_eq!(load_settings(&store).unwrap(), Settings::default());
    }

    #[test]
    fn test_rated_folder_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(load_rated_folder(&store).unwrap(), None);
        save_rated_folder(&store, Some(&"folder:1".to_string())).unwrap();
        assert_eq!(load_rated_folder(&store).unwrap(), Some("folder:1".to_string()));
        save_rated_folder(&store, None).unwrap();
        assert_eq!(load_rated_folder(&store).unwrap(), None);
    }

    #[test]
    fn test_playlist_uris_skip_bad_keys() {
        let store = MemoryStore::new();
        store
            .set(PLAYLIST_URIS_KEY, r#"{"4.0":"playlist:a","bogus":"playlist:b"}"#)
            .unwrap();
        let mapping = load_playlist_uris(&store).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[&"4.0".parse::<Rating>().unwrap()], "playlist:a");
    }

    #[test]
    fn test_playlist_uris_serialize_canonical_keys() {
        let store = MemoryStore::new();
        let mut mapping = BTreeMap::new();
        mapping.insert("0.5".parse::<Rating>().unwrap(), "playlist:x".to_string());
        save_playlist_uris(&store, &mapping).unwrap();
        assert_eq!(
            store.get(PLAYLIST_URIS_KEY).unwrap().unwrap(),
            r#"{"0.5":"playlist:x"}"#
        );
    }
}
