//! Engine settings.
//!
//! Everything the patch pipeline and the process controllers treat as a
//! tunable constant lives in `EngineSettings`: the known config filenames,
//! the fallback scan rules, the backup suffix, the command timeout and the
//! install locations probed by detection.
//!
//! # Settings Management
//!
//! `SettingsManager` loads `~/.config/game-tuner/settings.json` and falls
//! back to defaults when the file is missing or unreadable. See `loader`
//! for the file I/O.

pub mod loader;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Known config filenames, checked in this order.
pub const DEFAULT_KNOWN_FILENAMES: &[&str] = &[
    "GameUserSettings.ini",
    "GameUserSettings.cfg",
    "settings.cfg",
    "config.json",
    "config.cfg",
    "settings.ini",
];

/// Name fragments accepted by the fallback scan.
pub const DEFAULT_NAME_FRAGMENTS: &[&str] = &["config", "settings"];

/// Extensions accepted by the fallback scan.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ini", "cfg", "json"];

pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_EXECUTABLE_NAME: &str = "Bloodstrike.exe";

/// Tunables for discovery, backup, detection and process control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Tier 1 discovery list
    pub known_filenames: Vec<String>,
    /// Tier 2 discovery: case-insensitive substrings of the file name
    pub name_fragments: Vec<String>,
    /// Tier 2 discovery: extensions without the leading dot
    pub extensions: Vec<String>,
    pub backup_suffix: String,
    /// Upper bound for a single external process command
    pub command_timeout_ms: u64,
    /// Executable looked for by installation detection
    pub executable_name: String,
    /// Explicit detection candidates; when empty the platform defaults are used
    pub install_candidates: Vec<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            known_filenames: DEFAULT_KNOWN_FILENAMES.iter().map(|s| s.to_string()).collect(),
            name_fragments: DEFAULT_NAME_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            executable_name: DEFAULT_EXECUTABLE_NAME.to_string(),
            install_candidates: Vec::new(),
        }
    }
}

impl EngineSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Reject settings that would make the pipeline unsafe or useless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backup_suffix.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "backup_suffix cannot be empty".to_string(),
            ));
        }
        if self.backup_suffix.contains('/') || self.backup_suffix.contains('\\') {
            return Err(ConfigError::ValidationFailed(format!(
                "backup_suffix must not contain path separators: {}",
                self.backup_suffix
            )));
        }
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "command_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.known_filenames.is_empty()
            && self.name_fragments.is_empty()
            && self.extensions.is_empty()
        {
            return Err(ConfigError::ValidationFailed(
                "discovery has no filenames, fragments or extensions to match".to_string(),
            ));
        }
        if self.executable_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "executable_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads and saves `EngineSettings`.
pub struct SettingsManager;

impl SettingsManager {
    /// Load settings from the global settings path, or defaults.
    ///
    /// A missing file is normal. A corrupt or invalid file is logged and
    /// replaced by defaults rather than failing the caller.
    pub fn load() -> EngineSettings {
        match loader::get_global_settings_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                log::warn!("[Config] Cannot resolve settings path, using defaults: {}", e);
                EngineSettings::default()
            }
        }
    }

    /// Load settings from an explicit path, or defaults.
    pub fn load_from(path: &Path) -> EngineSettings {
        if !path.exists() {
            return EngineSettings::default();
        }
        match loader::load_settings_from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "[Config] [WARNING] Failed to load {}, falling back to defaults: {}",
                    path.display(),
                    e
                );
                EngineSettings::default()
            }
        }
    }

    /// Save settings to the global settings path.
    pub fn save(settings: &EngineSettings) -> Result<PathBuf, ConfigError> {
        loader::ensure_settings_dir_exists()?;
        let path = loader::get_global_settings_path()?;
        loader::save_settings_to_file(settings, &path)?;
        Ok(path)
    }
}
