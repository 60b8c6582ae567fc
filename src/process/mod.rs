//! Process control: priority changes and forced termination.

pub mod control;
pub mod priority;
pub mod terminate;

use crate::error::ProcessError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub use control::{ProcessControl, SystemProcessControl};
pub use priority::PriorityController;
pub use terminate::ProcessTerminator;

/// Characters allowed in a process name.
static PROCESS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w .()-]+$").expect("static process name pattern"));

/// Process name without its extension: `Game.exe` -> `Game`.
pub fn base_process_name(name: &str) -> &str {
    let name = name.trim();
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Check a process name before it reaches a command line.
///
/// Names are interpolated into `powershell` scripts on Windows, so anything
/// outside a conservative character set is refused.
pub fn validate_process_name(name: &str) -> Result<&str, ProcessError> {
    let base = base_process_name(name);
    if base.is_empty() {
        return Err(ProcessError::InvalidArgument(
            "process name cannot be empty".to_string(),
        ));
    }

    if !PROCESS_NAME.is_match(name.trim()) {
        return Err(ProcessError::InvalidArgument(format!(
            "process name '{}' contains unsupported characters",
            name
        )));
    }

    Ok(base)
}
