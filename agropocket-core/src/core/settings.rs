//! Workspace settings persistence.
//!
//! Settings live in a JSON file at an OS-appropriate location. Missing keys
//! fall back to their defaults, so older files keep loading as fields are added.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

/// Persisted workspace settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// SQLite file holding the key-value store.
    pub data_file: String,
    /// Prefix of every storage key, e.g. `agropocket` gives `agropocket_users`.
    pub key_prefix: String,
    /// Harvests dated within this many days count as recent on the dashboard.
    pub recent_harvest_days: u32,
    /// Number of history entries shown as recent activity.
    pub recent_activity_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file().to_string_lossy().to_string(),
            key_prefix: "agropocket".to_string(),
            recent_harvest_days: 30,
            recent_activity_limit: 5,
        }
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/agropocket/settings.json`
/// - Windows: `%APPDATA%/AgroPocket/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("AgroPocket").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("agropocket").join("settings.json")
    }
}

/// Returns the default data file: `<data dir>/agropocket/agropocket.db`.
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agropocket")
        .join("agropocket.db")
}

/// Loads settings from the default location.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_file_path())
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings file {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Saves settings to the default location.
pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_file_path(), settings)
}

/// Saves settings to `path`, creating parent directories as needed.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}
