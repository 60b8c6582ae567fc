//! Game Tuner engine
//!
//! Applies performance-oriented overrides to a game's text configuration
//! files without losing the originals, and issues best-effort priority and
//! termination requests against running processes.
//!
//! The system is organized into functional modules:
//! - **error**: Error taxonomy (`PatchError`, `ProcessError`, `ConfigError`)
//! - **models**: Core data structures and types
//! - **config**: Engine settings and the settings file loader
//! - **system**: Installation path resolution, detection and logging setup
//! - **patcher**: Discovery, backup, pattern substitution and atomic writes
//! - **orchestrator**: Per-directory serialized patch runs
//! - **process**: Priority changes and forced termination
//! - **controller**: The facade used by the CLI

// Core foundational modules
pub mod error;
pub mod models;

pub mod config;
pub mod system;

// Robust, decoupled logging system
pub mod log_collector;

pub mod patcher;
pub mod orchestrator;
pub mod process;
pub mod controller;

// Re-export the log crate for macro usage
pub use log;

pub use system::initialize_logging;
pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{ConfigError, ErrorKind, PatchError, ProcessError, Result};

pub use models::{
    BackupRecord, CommandOutcome, DetectionResult, DiscoveredFile, DiscoveryMethod,
    InstallationTarget, OverrideSet, OverrideValue, PatchReport, PatchResult, PatchStatus,
    PriorityLevel,
};

pub use config::{EngineSettings, SettingsManager};
pub use controller::EngineController;
pub use orchestrator::{DirectoryLocks, PatchOptions, PatchOrchestrator};
pub use patcher::substitution::{DialectMatcher, MatcherStrategy, SubstitutionEngine};
pub use patcher::writer::{AtomicWriter, FileWriter};
pub use process::{ProcessControl, SystemProcessControl};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
