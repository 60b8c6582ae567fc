//! Priority changes for a named process.

use super::{validate_process_name, ProcessControl};
use crate::error::ProcessError;
use crate::models::{CommandOutcome, PriorityLevel, ProcessAction, ProcessCommand};
use std::sync::Arc;
use std::time::Duration;

pub struct PriorityController {
    control: Arc<dyn ProcessControl>,
    timeout: Duration,
}

impl PriorityController {
    pub fn new(control: Arc<dyn ProcessControl>, timeout: Duration) -> Self {
        PriorityController { control, timeout }
    }

    /// Ask the OS to move `process_name` to `level`.
    ///
    /// `Foo.exe` and `Foo` name the same process. `success` means the request
    /// was dispatched within the timeout, not that a process was found.
    pub async fn set_priority(&self, process_name: &str, level: PriorityLevel) -> CommandOutcome {
        match self.try_set_priority(process_name, level).await {
            Ok(()) => CommandOutcome::dispatched(),
            Err(e) => {
                log::warn!("[Priority] {}", e);
                CommandOutcome::from(e)
            }
        }
    }

    /// `set_priority` with a textual level such as `"High"`.
    ///
    /// Unknown labels are refused before anything is dispatched.
    pub async fn set_priority_label(&self, process_name: &str, label: &str) -> CommandOutcome {
        match label.parse::<PriorityLevel>() {
            Ok(level) => self.set_priority(process_name, level).await,
            Err(msg) => CommandOutcome::from(ProcessError::InvalidArgument(msg)),
        }
    }

    async fn try_set_priority(&self, process_name: &str, level: PriorityLevel) -> Result<(), ProcessError> {
        let base = validate_process_name(process_name)?;
        let command = ProcessCommand {
            target: base.to_string(),
            action: ProcessAction::SetPriority(level),
        };
        log::info!("[Priority] Dispatching {}", command);

        match tokio::time::timeout(self.timeout, self.control.set_priority(base, level)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ProcessError::CommandFailed {
                cmd: command.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ProcessError::Timeout {
                cmd: command.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
