//! Unified error type hierarchy for Game Tuner
//!
//! Provides structured error handling with PatchError, ProcessError and
//! ConfigError, plus a stable `ErrorKind` tag for callers that need a
//! machine-readable failure category.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Machine-readable failure category surfaced at the caller boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorKind {
    InstallationNotFound,
    NoConfigFound,
    BackupFailed,
    WriteFailed,
    ProcessCommandFailed,
    InvalidArgument,
}

/// Configuration patching errors.
///
/// `InstallationNotFound`, `NoConfigFound` and `InvalidArgument` abort the
/// whole call. The remaining variants are produced per file and end up as
/// `Error` entries in a `PatchReport`.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Installation not found: {0}")]
    InstallationNotFound(String),

    #[error("No config files found in {}", .0.display())]
    NoConfigFound(PathBuf),

    #[error("Backup of {} failed: {source}", path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::InstallationNotFound(_) => ErrorKind::InstallationNotFound,
            PatchError::NoConfigFound(_) => ErrorKind::NoConfigFound,
            PatchError::BackupFailed { .. } => ErrorKind::BackupFailed,
            // A file that cannot be read cannot be rewritten either
            PatchError::ReadFailed { .. } | PatchError::WriteFailed { .. } => ErrorKind::WriteFailed,
            PatchError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Whether this error aborts the whole operation rather than one file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PatchError::InstallationNotFound(_)
                | PatchError::NoConfigFound(_)
                | PatchError::InvalidArgument(_)
        )
    }

    /// Get a user-facing error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            PatchError::InstallationNotFound(path) => {
                format!("Game executable not found: {}", path)
            }
            PatchError::NoConfigFound(dir) => {
                format!("No config files found next to the game in {}", dir.display())
            }
            PatchError::BackupFailed { path, .. } => format!(
                "Could not back up {}; the file was left untouched",
                path.display()
            ),
            PatchError::ReadFailed { path, .. } => format!("Could not read {}", path.display()),
            PatchError::WriteFailed { path, .. } => format!(
                "Could not write {}; the original file is unchanged",
                path.display()
            ),
            PatchError::InvalidArgument(msg) => format!("Invalid input: {}", msg),
        }
    }
}

/// Process control errors (priority changes, termination).
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Command '{cmd}' failed: {reason}")]
    CommandFailed { cmd: String, reason: String },

    #[error("Command '{cmd}' timed out after {timeout_ms}ms")]
    Timeout { cmd: String, timeout_ms: u64 },
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ProcessError::CommandFailed { .. } | ProcessError::Timeout { .. } => {
                ErrorKind::ProcessCommandFailed
            }
        }
    }
}

/// Engine settings file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Result alias for patching operations.
pub type Result<T> = std::result::Result<T, PatchError>;
