//! System module: installation paths and logging setup

pub mod paths;

use crate::log_collector::LogCollector;
use log::LevelFilter;
use std::path::PathBuf;

/// Install a `LogCollector` as the global `log` backend.
///
/// Lines go to `<log_dir>/full` and `<log_dir>/parsed`. Warnings are echoed
/// to stderr; with `verbose`, debug output is recorded and echoed as well.
///
/// The returned handle is the one to `wait_for_empty()` on before exit.
pub fn initialize_logging(log_dir: PathBuf, verbose: bool) -> Result<LogCollector, String> {
    let (level, echo) = if verbose {
        (LevelFilter::Debug, Some(LevelFilter::Debug))
    } else {
        (LevelFilter::Info, Some(LevelFilter::Warn))
    };

    let collector = LogCollector::new(log_dir, level, echo)?;
    log::set_boxed_logger(Box::new(collector.clone()))
        .map_err(|e| format!("Failed to install logger: {}", e))?;
    log::set_max_level(level);

    log::debug!(
        "[System] Logging to {} and {}",
        collector.full_log_path().display(),
        collector.parsed_log_path().display()
    );
    Ok(collector)
}

/// Logging macros for convenient access
/// Use the log crate directly for target-aware routing
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        log::info!("{}", msg);
    }}
}

#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        // Use target="parsed" for high-level events
        log::info!(target: "parsed", "{}", msg);
    }}
}
