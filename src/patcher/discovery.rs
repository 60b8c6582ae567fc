//! Config file discovery.
//!
//! Two tiers: exact known filenames first, and only when none of them exist,
//! a single non-recursive scan that accepts names containing a configured
//! fragment or ending in a configured extension. The tiers are never merged.

use crate::config::EngineSettings;
use crate::error::PatchError;
use crate::models::{DiscoveredFile, DiscoveryMethod};
use std::fs;
use std::path::Path;

/// Discover candidate config files in an installation directory.
///
/// The result is sorted by file name and free of duplicates.
///
/// # Returns
/// `Err(PatchError::NoConfigFound)` when neither tier produced a file
pub fn discover_config_files(
    dir: &Path,
    settings: &EngineSettings,
) -> Result<Vec<DiscoveredFile>, PatchError> {
    let mut files = find_known_files(dir, &settings.known_filenames);

    if files.is_empty() {
        log::debug!(
            "[Discovery] No known config names in {}, falling back to directory scan",
            dir.display()
        );
        files = scan_for_config_files(dir, settings)?;
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files.dedup_by(|a, b| a.path == b.path);

    if files.is_empty() {
        return Err(PatchError::NoConfigFound(dir.to_path_buf()));
    }

    for file in &files {
        log::info!(
            "[Discovery] Found {} ({:?})",
            file.path.display(),
            file.method
        );
    }

    Ok(files)
}

/// Tier 1: every known filename that exists as a regular file.
pub fn find_known_files(dir: &Path, known_filenames: &[String]) -> Vec<DiscoveredFile> {
    known_filenames
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .map(|path| DiscoveredFile {
            path,
            method: DiscoveryMethod::KnownName,
        })
        .collect()
}

/// Tier 2: one `read_dir` pass over the directory.
pub fn scan_for_config_files(
    dir: &Path,
    settings: &EngineSettings,
) -> Result<Vec<DiscoveredFile>, PatchError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        log::warn!("[Discovery] Cannot list {}: {}", dir.display(), e);
        PatchError::NoConfigFound(dir.to_path_buf())
    })?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if matches_config_pattern(&name, settings) {
            files.push(DiscoveredFile {
                path,
                method: DiscoveryMethod::PatternMatch,
            });
        }
    }

    Ok(files)
}

/// Case-insensitive fallback rule. Our own backups never qualify.
pub fn matches_config_pattern(file_name: &str, settings: &EngineSettings) -> bool {
    let lower = file_name.to_lowercase();

    if !settings.backup_suffix.is_empty() && lower.ends_with(&settings.backup_suffix.to_lowercase()) {
        return false;
    }

    let has_fragment = settings
        .name_fragments
        .iter()
        .any(|fragment| lower.contains(&fragment.to_lowercase()));

    let has_extension = settings.extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_lowercase();
        lower.ends_with(&format!(".{}", ext))
    });

    has_fragment || has_extension
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x=1\n").unwrap();
    }

    #[test]
    fn test_known_name_found_without_fallback() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "config.json");
        touch(temp_dir.path(), "custom_settings.txt");

        let files = discover_config_files(temp_dir.path(), &EngineSettings::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "config.json");
        assert_eq!(files[0].method, DiscoveryMethod::KnownName);
    }

    #[test]
    fn test_all_known_names_are_collected() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "settings.ini");
        touch(temp_dir.path(), "GameUserSettings.ini");
        touch(temp_dir.path(), "config.cfg");

        let files = discover_config_files(temp_dir.path(), &EngineSettings::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["GameUserSettings.ini", "config.cfg", "settings.ini"]);
    }

    #[test]
    fn test_fallback_scan_picks_pattern_matches() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "custom_settings.txt");
        touch(temp_dir.path(), "engine.INI");
        touch(temp_dir.path(), "readme.txt");
        touch(temp_dir.path(), "engine.ini.bak");
        fs::create_dir(temp_dir.path().join("config_dir")).unwrap();

        let files = discover_config_files(temp_dir.path(), &EngineSettings::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["custom_settings.txt", "engine.INI"]);
        assert!(files.iter().all(|f| f.method == DiscoveryMethod::PatternMatch));
    }

    #[test]
    fn test_empty_directory_is_no_config_found() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "Game.exe");

        let result = discover_config_files(temp_dir.path(), &EngineSettings::default());
        assert!(matches!(result, Err(PatchError::NoConfigFound(_))));
    }

    #[test]
    fn test_pattern_rule() {
        let settings = EngineSettings::default();
        assert!(matches_config_pattern("MyConfig.dat", &settings));
        assert!(matches_config_pattern("user.Settings", &settings));
        assert!(matches_config_pattern("video.cfg", &settings));
        assert!(matches_config_pattern("prefs.JSON", &settings));
        assert!(!matches_config_pattern("video.cfg.bak", &settings));
        assert!(!matches_config_pattern("game.exe", &settings));
        assert!(!matches_config_pattern("jsonfile.txt", &settings));
    }

    #[test]
    fn test_discovery_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.cfg", "a.ini", "c.json"] {
            touch(temp_dir.path(), name);
        }
        let settings = EngineSettings::default();
        let first = discover_config_files(temp_dir.path(), &settings).unwrap();
        let second = discover_config_files(temp_dir.path(), &settings).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].file_name(), "a.ini");
    }
}
