//! One-time pristine backups.
//!
//! The backup of `F` is `F` + suffix (`settings.ini.bak`). It is written at
//! most once: an existing backup is the earliest known-good state and is
//! never replaced. The filesystem is the record; nothing is kept in memory.

use crate::error::PatchError;
use crate::models::BackupRecord;
use crate::patcher::writer;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct BackupManager {
    suffix: String,
}

impl BackupManager {
    pub fn new(suffix: impl Into<String>) -> Self {
        BackupManager {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn backup_path(&self, original: &Path) -> PathBuf {
        let mut path = original.as_os_str().to_owned();
        path.push(&self.suffix);
        PathBuf::from(path)
    }

    pub fn has_backup(&self, original: &Path) -> bool {
        self.backup_path(original).is_file()
    }

    /// Make sure a backup of `original` exists.
    ///
    /// The copy goes to a temporary sibling first and is linked into place
    /// without clobbering, so a concurrent or interrupted run can never
    /// leave a truncated backup or overwrite an older one.
    pub fn ensure_backup(&self, original: &Path) -> Result<BackupRecord, PatchError> {
        let backup = self.backup_path(original);

        if backup.exists() {
            log::debug!("[Patcher] [BACKUP] Keeping existing backup {}", backup.display());
            return Ok(BackupRecord {
                original: original.to_path_buf(),
                backup,
                created: false,
            });
        }

        let failed = |source: io::Error| PatchError::BackupFailed {
            path: original.to_path_buf(),
            source,
        };

        let dir = writer::parent_dir(original);
        let mut source = File::open(original).map_err(failed)?;
        let mut temp = NamedTempFile::new_in(dir).map_err(failed)?;
        io::copy(&mut source, temp.as_file_mut()).map_err(failed)?;
        temp.as_file().sync_all().map_err(failed)?;

        match temp.persist_noclobber(&backup) {
            Ok(_) => {
                log::info!("[Patcher] [BACKUP] Created {}", backup.display());
                Ok(BackupRecord {
                    original: original.to_path_buf(),
                    backup,
                    created: true,
                })
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                // Someone else won the race; theirs is the older copy
                Ok(BackupRecord {
                    original: original.to_path_buf(),
                    backup,
                    created: false,
                })
            }
            Err(e) => Err(failed(e.error)),
        }
    }

    /// Copy the backup back over `original`. The backup itself is kept.
    pub fn restore(&self, original: &Path) -> Result<BackupRecord, PatchError> {
        let backup = self.backup_path(original);

        let contents = std::fs::read(&backup).map_err(|source| PatchError::ReadFailed {
            path: backup.clone(),
            source,
        })?;

        writer::write_atomic(original, &contents).map_err(|source| PatchError::WriteFailed {
            path: original.to_path_buf(),
            source,
        })?;

        log::info!(
            "[Patcher] [RESTORE] Restored {} from {}",
            original.display(),
            backup.display()
        );

        Ok(BackupRecord {
            original: original.to_path_buf(),
            backup,
            created: false,
        })
    }
}

impl Default for BackupManager {
    fn default() -> Self {
        BackupManager::new(crate::config::DEFAULT_BACKUP_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_suffix() {
        let manager = BackupManager::default();
        assert_eq!(
            manager.backup_path(Path::new("/g/settings.ini")),
            PathBuf::from("/g/settings.ini.bak")
        );
        assert_eq!(
            BackupManager::new(".orig").backup_path(Path::new("config")),
            PathBuf::from("config.orig")
        );
    }

    #[test]
    fn test_backup_copies_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("settings.ini");
        fs::write(&file, b"fov=90\r\n\xff").unwrap();

        let record = BackupManager::default().ensure_backup(&file).unwrap();
        assert!(record.created);
        assert_eq!(fs::read(&record.backup).unwrap(), b"fov=90\r\n\xff");
    }

    #[test]
    fn test_backup_is_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("settings.ini");
        let manager = BackupManager::default();

        fs::write(&file, "fov=90\n").unwrap();
        assert!(manager.ensure_backup(&file).unwrap().created);

        fs::write(&file, "fov=120\n").unwrap();
        for _ in 0..3 {
            assert!(!manager.ensure_backup(&file).unwrap().created);
        }
        assert_eq!(
            fs::read_to_string(manager.backup_path(&file)).unwrap(),
            "fov=90\n"
        );
    }

    #[test]
    fn test_backup_of_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("gone.ini");
        let result = BackupManager::default().ensure_backup(&file);
        assert!(matches!(result, Err(PatchError::BackupFailed { .. })));
        assert!(!BackupManager::default().has_backup(&file));
    }

    #[test]
    fn test_restore_brings_back_original() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("settings.ini");
        let manager = BackupManager::default();

        fs::write(&file, "fov=90\n").unwrap();
        manager.ensure_backup(&file).unwrap();
        fs::write(&file, "fov=120\n").unwrap();

        manager.restore(&file).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "fov=90\n");
        assert!(manager.has_backup(&file));
    }

    #[test]
    fn test_restore_without_backup_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("settings.ini");
        fs::write(&file, "fov=90\n").unwrap();
        assert!(matches!(
            BackupManager::default().restore(&file),
            Err(PatchError::ReadFailed { .. })
        ));
    }
}
