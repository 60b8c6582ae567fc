//! Installation path resolution and detection.
//!
//! `resolve_installation` turns a caller-supplied executable path into an
//! `InstallationTarget`. `detect_installation` probes well-known install
//! locations and hands the first hit back as a value; nothing is cached
//! between calls.

use crate::config::EngineSettings;
use crate::error::PatchError;
use crate::models::{DetectionResult, InstallationTarget};
use std::path::{Path, PathBuf};

/// Resolve an executable path into its installation target.
///
/// # Returns
/// `Ok(InstallationTarget)` with the executable and its parent directory
/// `Err(PatchError::InstallationNotFound)` if the path is empty or missing
pub fn resolve_installation(executable: impl AsRef<Path>) -> Result<InstallationTarget, PatchError> {
    let executable = executable.as_ref();

    if executable.as_os_str().is_empty() {
        return Err(PatchError::InstallationNotFound(
            "executable path is empty".to_string(),
        ));
    }

    if !executable.exists() {
        return Err(PatchError::InstallationNotFound(
            executable.display().to_string(),
        ));
    }

    // Absolute paths keep discovery results and lock keys unambiguous
    let executable = executable
        .canonicalize()
        .unwrap_or_else(|_| executable.to_path_buf());

    let directory = match executable.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    log::debug!(
        "[Paths] Resolved installation {} -> {}",
        executable.display(),
        directory.display()
    );

    Ok(InstallationTarget::new(executable, directory))
}

/// Platform default install locations for `executable_name`.
pub fn default_install_candidates(executable_name: &str) -> Vec<PathBuf> {
    let stem = Path::new(executable_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| executable_name.to_string());

    let mut candidates = Vec::new();

    if cfg!(windows) {
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Ok(root) = std::env::var(var) {
                candidates.push(PathBuf::from(root).join(&stem).join(executable_name));
            }
        }
        if let Ok(profile) = std::env::var("USERPROFILE") {
            candidates.push(PathBuf::from(profile).join("Desktop").join(executable_name));
        }
    } else {
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join("Games").join(&stem).join(executable_name));
        }
        if let Some(data) = dirs::data_local_dir() {
            candidates.push(data.join(&stem).join(executable_name));
        }
        if let Some(desktop) = dirs::desktop_dir() {
            candidates.push(desktop.join(executable_name));
        }
    }

    candidates
}

/// Return the first existing path in `candidates`.
pub fn detect_installation_in(candidates: &[PathBuf]) -> DetectionResult {
    for candidate in candidates {
        if candidate.is_file() {
            log::info!("[Paths] [DETECT] Found installation at {}", candidate.display());
            return DetectionResult {
                found: true,
                path: Some(candidate.clone()),
            };
        }
    }

    log::info!(
        "[Paths] [DETECT] No installation found in {} candidate locations",
        candidates.len()
    );
    DetectionResult {
        found: false,
        path: None,
    }
}

/// Probe the configured (or platform default) install locations.
pub fn detect_installation(settings: &EngineSettings) -> DetectionResult {
    let candidates = if settings.install_candidates.is_empty() {
        default_install_candidates(&settings.executable_name)
    } else {
        settings.install_candidates.clone()
    };
    detect_installation_in(&candidates)
}
