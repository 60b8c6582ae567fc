//! Config patching: discovery, backup, substitution and atomic write-back.
//!
//! `ConfigPatcher` runs the per-file sequence. It never writes a file whose
//! backup could not be secured, and never writes a file it could not read
//! as text.

pub mod backup;
pub mod discovery;
pub mod substitution;
pub mod writer;

use crate::config::EngineSettings;
use crate::error::PatchError;
use crate::models::{DiscoveredFile, OverrideSet, PatchResult};
use backup::BackupManager;
use std::fs;
use std::path::Path;
use substitution::{SubstitutionEngine, SubstitutionOutcome};
use writer::{AtomicWriter, FileWriter};

pub use discovery::discover_config_files;

/// Per-file patch pipeline.
pub struct ConfigPatcher {
    backups: BackupManager,
    engine: SubstitutionEngine,
    writer: Box<dyn FileWriter>,
}

impl ConfigPatcher {
    pub fn new(settings: &EngineSettings) -> Self {
        Self::with_engine(settings, SubstitutionEngine::default())
    }

    /// Use a custom substitution engine (extra dialects).
    pub fn with_engine(settings: &EngineSettings, engine: SubstitutionEngine) -> Self {
        ConfigPatcher {
            backups: BackupManager::new(settings.backup_suffix.clone()),
            engine,
            writer: Box::new(AtomicWriter),
        }
    }

    /// Replace the write-back step. Backups and restores are unaffected.
    pub fn with_writer(mut self, writer: impl FileWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Backup, substitute and write one file.
    ///
    /// Every failure is folded into an `Error` result for this file.
    pub fn patch_file(&self, file: &DiscoveredFile, overrides: &OverrideSet) -> PatchResult {
        match self.try_patch_file(file, overrides) {
            Ok(outcome) => PatchResult::updated(file.clone(), Some(outcome.summary())),
            Err(e) => {
                log::error!("[Patcher] {}", e);
                PatchResult::error(file.clone(), e.to_string())
            }
        }
    }

    fn try_patch_file(
        &self,
        file: &DiscoveredFile,
        overrides: &OverrideSet,
    ) -> Result<SubstitutionOutcome, PatchError> {
        // No mutation without a backup
        self.backups.ensure_backup(&file.path)?;

        let original = read_text(&file.path)?;
        let outcome = self.engine.apply(&original, overrides);

        if outcome.changed_from(&original) {
            self.writer.write(&file.path, outcome.text.as_bytes()).map_err(|source| {
                PatchError::WriteFailed {
                    path: file.path.clone(),
                    source,
                }
            })?;
            log::info!(
                "[Patcher] Updated {} ({})",
                file.path.display(),
                outcome.summary()
            );
        } else {
            log::info!("[Patcher] {} already up to date", file.path.display());
        }

        Ok(outcome)
    }

    /// Compute what `patch_file` would write without touching the disk.
    pub fn preview_file(&self, file: &DiscoveredFile, overrides: &OverrideSet) -> PatchResult {
        match read_text(&file.path) {
            Ok(original) => {
                let outcome = self.engine.apply(&original, overrides);
                PatchResult::updated(file.clone(), Some(format!("dry run: {}", outcome.summary())))
            }
            Err(e) => PatchResult::error(file.clone(), e.to_string()),
        }
    }

    /// Restore one file from its backup.
    pub fn restore_file(&self, file: &DiscoveredFile) -> PatchResult {
        if !self.backups.has_backup(&file.path) {
            return PatchResult::error(file.clone(), "no backup to restore from");
        }
        match self.backups.restore(&file.path) {
            Ok(record) => PatchResult::updated(
                file.clone(),
                Some(format!("restored from {}", record.backup.display())),
            ),
            Err(e) => {
                log::error!("[Patcher] [RESTORE] {}", e);
                PatchResult::error(file.clone(), e.to_string())
            }
        }
    }
}

/// Read a file as UTF-8 text. Anything else is left alone.
fn read_text(path: &Path) -> Result<String, PatchError> {
    let bytes = fs::read(path).map_err(|source| PatchError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| PatchError::ReadFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, "file is not UTF-8 text"),
    })
}
