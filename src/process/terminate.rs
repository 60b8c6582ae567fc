//! Forced termination of named processes.

use super::{validate_process_name, ProcessControl};
use crate::error::{ErrorKind, ProcessError};
use crate::models::{CommandOutcome, ProcessAction, ProcessCommand};
use std::sync::Arc;
use std::time::Duration;

pub struct ProcessTerminator {
    control: Arc<dyn ProcessControl>,
    timeout: Duration,
}

impl ProcessTerminator {
    pub fn new(control: Arc<dyn ProcessControl>, timeout: Duration) -> Self {
        ProcessTerminator { control, timeout }
    }

    /// Issue one forced-termination request per name.
    ///
    /// Each request has its own timeout and a failure does not stop the
    /// rest. `success` is true only if every request was dispatched.
    pub async fn terminate(&self, names: &[String]) -> CommandOutcome {
        if names.is_empty() {
            return CommandOutcome::from(ProcessError::InvalidArgument(
                "no process names given".to_string(),
            ));
        }

        let mut failures = Vec::new();
        for name in names {
            if let Err(e) = self.terminate_one(name).await {
                log::warn!("[Terminate] {}", e);
                failures.push(e);
            }
        }

        log::info!(
            "[Terminate] {}/{} request(s) dispatched",
            names.len() - failures.len(),
            names.len()
        );

        // A dispatch failure outranks a rejected name.
        let kind = failures
            .iter()
            .map(ProcessError::kind)
            .find(|kind| *kind == ErrorKind::ProcessCommandFailed)
            .or_else(|| failures.first().map(ProcessError::kind));

        match kind {
            None => CommandOutcome::dispatched(),
            Some(kind) => {
                let detail: Vec<String> = failures.iter().map(ToString::to_string).collect();
                CommandOutcome::failed(kind, detail.join("; "))
            }
        }
    }

    async fn terminate_one(&self, name: &str) -> Result<(), ProcessError> {
        validate_process_name(name)?;
        let name = name.trim();
        let command = ProcessCommand {
            target: name.to_string(),
            action: ProcessAction::Terminate,
        };
        log::debug!("[Terminate] Dispatching {}", command);

        match tokio::time::timeout(self.timeout, self.control.terminate(name)).await {
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
