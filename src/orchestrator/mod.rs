//! Patch orchestration: resolve -> lock -> discover -> (backup -> substitute -> write) per file.
//!
//! Discovery failures abort the call. Everything after discovery is per
//! file: a file that fails is recorded and the loop moves on. The
//! cancellation signal is only looked at between files, so a file that
//! has started is always finished.

pub mod locks;

use std::sync::Arc;
use tokio::sync::watch;

use crate::config::EngineSettings;
use crate::error::PatchError;
use crate::models::{DiscoveredFile, InstallationTarget, OverrideSet, PatchReport, PatchResult};
use crate::patcher::{self, ConfigPatcher};
use crate::{log_info, log_parsed};

pub use locks::DirectoryLocks;

/// Per-call options for `apply_configuration_with`.
#[derive(Clone, Default)]
pub struct PatchOptions {
    /// Report what would change without backing up or writing
    pub dry_run: bool,
    /// Stop between files once this flips to `true`
    pub cancel: Option<watch::Receiver<bool>>,
}

impl PatchOptions {
    pub fn dry_run() -> Self {
        PatchOptions {
            dry_run: true,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }
}

/// Drives the patch pipeline for one installation at a time per directory.
#[derive(Clone)]
pub struct PatchOrchestrator {
    settings: Arc<EngineSettings>,
    patcher: Arc<ConfigPatcher>,
    locks: DirectoryLocks,
}

impl PatchOrchestrator {
    pub fn new(settings: EngineSettings) -> Self {
        let patcher = ConfigPatcher::new(&settings);
        PatchOrchestrator::with_patcher(settings, patcher)
    }

    pub fn with_patcher(settings: EngineSettings, patcher: ConfigPatcher) -> Self {
        PatchOrchestrator {
            settings: Arc::new(settings),
            patcher: Arc::new(patcher),
            locks: DirectoryLocks::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn locks(&self) -> &DirectoryLocks {
        &self.locks
    }

    /// Apply `overrides` to every discovered config file of `target`.
    pub async fn apply_configuration(
        &self,
        target: &InstallationTarget,
        overrides: &OverrideSet,
    ) -> Result<PatchReport, PatchError> {
        self.apply_configuration_with(target, overrides, PatchOptions::default())
            .await
    }

    /// `apply_configuration` with dry-run and cancellation control.
    ///
    /// # Returns
    /// `Ok(PatchReport)` with one result per processed file, in discovery order
    /// `Err` only for `InvalidArgument` or `NoConfigFound`
    pub async fn apply_configuration_with(
        &self,
        target: &InstallationTarget,
        overrides: &OverrideSet,
        options: PatchOptions,
    ) -> Result<PatchReport, PatchError> {
        if overrides.is_empty() {
            return Err(PatchError::InvalidArgument(
                "override set is empty".to_string(),
            ));
        }
        overrides.validate()?;

        let _guard = self.locks.acquire(target.directory()).await;
        log_parsed!(
            "PATCH: {} override(s) for {}{}",
            overrides.len(),
            target.directory().display(),
            if options.dry_run { " (dry run)" } else { "" }
        );

        let files = self.discover(target).await?;
        let overrides = Arc::new(overrides.clone());
        let dry_run = options.dry_run;

        let report = self
            .for_each_file(files, &options, move |patcher, file| {
                if dry_run {
                    patcher.preview_file(file, &overrides)
                } else {
                    patcher.patch_file(file, &overrides)
                }
            })
            .await;

        log_parsed!(
            "PATCH: {}/{} file(s) updated{}",
            report.results.iter().filter(|r| r.is_updated()).count(),
            report.results.len(),
            if report.cancelled { ", cancelled" } else { "" }
        );
        Ok(report)
    }

    /// Restore every discovered file that has a backup.
    ///
    /// Files without a backup are reported as errors and left alone.
    pub async fn restore_configuration(
        &self,
        target: &InstallationTarget,
    ) -> Result<PatchReport, PatchError> {
        let _guard = self.locks.acquire(target.directory()).await;
        log_parsed!("RESTORE: {}", target.directory().display());

        let files = self.discover(target).await?;
        let report = self
            .for_each_file(files, &PatchOptions::default(), |patcher, file| {
                patcher.restore_file(file)
            })
            .await;
        Ok(report)
    }

    async fn discover(&self, target: &InstallationTarget) -> Result<Vec<DiscoveredFile>, PatchError> {
        let dir = target.directory().to_path_buf();
        let settings = Arc::clone(&self.settings);
        tokio::task::spawn_blocking(move || patcher::discover_config_files(&dir, &settings))
            .await
            .map_err(|e| PatchError::InvalidArgument(format!("discovery task failed: {}", e)))?
    }

    /// Run `step` for each file on the blocking pool, one file at a time.
    async fn for_each_file<F>(
        &self,
        files: Vec<DiscoveredFile>,
        options: &PatchOptions,
        step: F,
    ) -> PatchReport
    where
        F: Fn(&ConfigPatcher, &DiscoveredFile) -> PatchResult + Send + Sync + 'static,
    {
        let step = Arc::new(step);
        let mut results = Vec::with_capacity(files.len());
        let mut cancelled = false;

        for file in files {
            if options.is_cancelled() {
                log_info!("[Orchestrator] Cancelled before {}", file.path.display());
                cancelled = true;
                break;
            }

            let patcher = Arc::clone(&self.patcher);
            let step = Arc::clone(&step);
            let task_file = file.clone();
            let result = tokio::task::spawn_blocking(move || step(&patcher, &task_file))
                .await
                .unwrap_or_else(|e| PatchResult::error(file, format!("patch task failed: {}", e)));
            results.push(result);
        }

        PatchReport {
            success: true,
            results,
            cancelled,
        }
    }
}
