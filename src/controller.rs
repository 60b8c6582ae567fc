//! Engine facade used by the CLI and by embedding callers.
//!
//! `EngineController` owns one orchestrator (and so one lock registry) and
//! one process capability. Path strings and priority labels come in here;
//! typed values go out.

use crate::config::EngineSettings;
use crate::error::PatchError;
use crate::models::{CommandOutcome, DetectionResult, OverrideSet, PatchReport, PriorityLevel};
use crate::orchestrator::{PatchOptions, PatchOrchestrator};
use crate::process::{PriorityController, ProcessControl, ProcessTerminator, SystemProcessControl};
use crate::system::paths;
use std::sync::Arc;

pub struct EngineController {
    orchestrator: PatchOrchestrator,
    priority: PriorityController,
    terminator: ProcessTerminator,
}

impl EngineController {
    pub fn new(settings: EngineSettings) -> Self {
        EngineController::with_process_control(settings, Arc::new(SystemProcessControl::new()))
    }

    /// Build with a custom process capability (tests, sandboxes).
    pub fn with_process_control(settings: EngineSettings, control: Arc<dyn ProcessControl>) -> Self {
        let timeout = settings.command_timeout();
        EngineController {
            priority: PriorityController::new(Arc::clone(&control), timeout),
            terminator: ProcessTerminator::new(control, timeout),
            orchestrator: PatchOrchestrator::new(settings),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        self.orchestrator.settings()
    }

    pub fn orchestrator(&self) -> &PatchOrchestrator {
        &self.orchestrator
    }

    pub fn detect_installation(&self) -> DetectionResult {
        paths::detect_installation(self.settings())
    }

    pub async fn apply_configuration(
        &self,
        install_path: &str,
        overrides: OverrideSet,
    ) -> Result<PatchReport, PatchError> {
        self.apply_configuration_with(install_path, overrides, PatchOptions::default())
            .await
    }

    pub async fn apply_configuration_with(
        &self,
        install_path: &str,
        overrides: OverrideSet,
        options: PatchOptions,
    ) -> Result<PatchReport, PatchError> {
        if overrides.is_empty() {
            return Err(PatchError::InvalidArgument(
                "override set is empty".to_string(),
            ));
        }
        overrides.validate()?;
        let target = paths::resolve_installation(install_path)?;
        self.orchestrator
            .apply_configuration_with(&target, &overrides, options)
            .await
    }

    /// `apply_configuration` from a JSON object of string or number values.
    pub async fn apply_configuration_json(
        &self,
        install_path: &str,
        overrides: &serde_json::Value,
    ) -> Result<PatchReport, PatchError> {
        let overrides = OverrideSet::from_json(overrides)?;
        self.apply_configuration(install_path, overrides).await
    }

    pub async fn restore_configuration(&self, install_path: &str) -> Result<PatchReport, PatchError> {
        let target = paths::resolve_installation(install_path)?;
        self.orchestrator.restore_configuration(&target).await
    }

    pub async fn set_process_priority(&self, process_name: &str, priority: &str) -> CommandOutcome {
        self.priority.set_priority_label(process_name, priority).await
    }

    pub async fn terminate_processes(&self, names: &[String]) -> CommandOutcome {
        self.terminator.terminate(names).await
    }

    /// Raise `process_name` to High and end every process in `kill_list`.
    ///
    /// Both requests go out regardless of how the other one fared.
    pub async fn emergency_optimize(&self, process_name: &str, kill_list: &[String]) -> CommandOutcome {
        crate::log_parsed!(
            "EMERGENCY: raising {} and ending {} process(es)",
            process_name,
            kill_list.len()
        );

        let raised = self.priority.set_priority(process_name, PriorityLevel::High).await;
        let killed = if kill_list.is_empty() {
            CommandOutcome::dispatched()
        } else {
            self.terminator.terminate(kill_list).await
        };

        let details: Vec<String> = [("priority", raised.detail), ("terminate", killed.detail)]
            .into_iter()
            .filter_map(|(label, detail)| detail.map(|d| format!("{}: {}", label, d)))
            .collect();

        CommandOutcome {
            success: raised.success && killed.success,
            kind: raised.kind.or(killed.kind),
            detail: if details.is_empty() {
                None
            } else {
                Some(details.join("; "))
            },
        }
    }
}
