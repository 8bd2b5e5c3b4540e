//! Configuration loading and data folder resolution

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "STARSHELF_DATA_FOLDER";

/// Tunables of the rating store and playback director
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Track count at which a rating playlist is considered full
    pub shard_capacity: usize,

    /// Attempts when searching for an unused playlist name
    pub max_name_attempts: u32,

    /// Maximum tracks per add call to the catalog
    pub insert_batch_size: usize,

    /// Delay before follow-up calls that need the service to settle
    /// (making a new playlist private, re-checking the queue after a track change)
    pub settle_delay: Duration,

    /// Name of the rated folder created on first rating
    pub rated_folder_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shard_capacity: 8000,
            max_name_attempts: 100,
            insert_batch_size: 50,
            settle_delay: Duration::from_secs(1),
            rated_folder_name: "Rated".to_string(),
        }
    }
}

impl StoreConfig {
    /// Same tunables without settle delays
    pub fn without_delays() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Data folder resolution, in priority order:
/// 1. Explicit argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(explicit: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Explicit argument
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = config_file_path() {
        match read_data_folder_from(&config_path) {
            Ok(Some(folder)) => return folder,
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring config file {}: {}", config_path.display(), e),
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Read the `data_folder` key from a TOML config file
pub fn read_data_folder_from(config_path: &std::path::Path) -> Result<Option<PathBuf>> {
    let content = std::fs::read_to_string(config_path)?;
    let config: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", config_path.display(), e)))?;
    Ok(config
        .get("data_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from))
}

/// Get the configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .map(|d| d.join("starshelf").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("starshelf"))
        .unwrap_or_else(|| PathBuf::from("./starshelf_data"))
}
