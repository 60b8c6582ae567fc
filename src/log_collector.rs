//! Decoupled logging pipeline.
//!
//! Every `log::*!` call is turned into a `LogLine` and pushed onto an
//! unbounded crossbeam channel. A dedicated OS thread drains the channel and
//! appends to per-session files:
//!
//! ```text
//! log::info!() ──> [LogCollector] ──(crossbeam)──> persister thread
//!                                                   ├─> logs/full/<ts>_full.log      (every line)
//!                                                   ├─> logs/parsed/<ts>_parsed.log  (target "parsed")
//!                                                   └─> stderr                       (optional echo)
//! ```
//!
//! Sending never blocks the caller, so logging from inside blocking tasks
//! or nested runtimes is safe. `wait_for_empty` is the barrier to use
//! before the process exits.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or flush marker.
enum LogMessage {
    Line(LogLine),
    Flush(std::sync::mpsc::Sender<()>),
}

/// Get the default logs path relative to the current working directory: ./logs
pub fn get_global_logs_path() -> Result<PathBuf, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to get current working directory: {}", e))?;
    Ok(cwd.join("logs"))
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    /// Also written to the parsed log
    pub parsed: bool,
    /// `HH:MM:SS.mmm`
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            parsed: false,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(level: Level, message: String) -> Self {
        LogLine {
            parsed: true,
            ..LogLine::new(level, message)
        }
    }

    fn format(&self) -> String {
        format!("[{}] [{}] {}\n", self.timestamp, self.level, self.message)
    }
}

/// `log::Log` implementation that persists through a background thread.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    full_log_path: PathBuf,
    parsed_log_path: PathBuf,
    level: LevelFilter,
}

impl LogCollector {
    /// Create the session log files under `log_dir` and start the persister.
    ///
    /// `echo` copies lines at or above that level to stderr.
    pub fn new(log_dir: PathBuf, level: LevelFilter, echo: Option<LevelFilter>) -> Result<Self, String> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        std::fs::create_dir_all(&full_log_dir)
            .map_err(|e| format!("Failed to create full log dir: {}", e))?;
        std::fs::create_dir_all(&parsed_log_dir)
            .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

        let session = Local::now().format("%Y%m%d_%H%M%S%.3f").to_string();
        let full_log_path = full_log_dir.join(format!("{}_full.log", session));
        let parsed_log_path = parsed_log_dir.join(format!("{}_parsed.log", session));

        let mut full = open_append(&full_log_path)?;
        let mut parsed = open_append(&parsed_log_path)?;

        let (tx, rx) = unbounded::<LogMessage>();

        // OS thread, not a tokio task: lines sent from any runtime (or none) reach disk
        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let formatted = line.format();
                        let _ = full.write_all(formatted.as_bytes());
                        if line.parsed {
                            let _ = parsed.write_all(formatted.as_bytes());
                        }
                        if echo.map_or(false, |max| line.level <= max) {
                            eprint!("{}", formatted);
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = full.flush();
                        let _ = parsed.flush();
                        let _ = full.sync_data();
                        let _ = parsed.sync_data();
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector {
            tx,
            full_log_path,
            parsed_log_path,
            level,
        })
    }

    pub fn full_log_path(&self) -> &Path {
        &self.full_log_path
    }

    pub fn parsed_log_path(&self) -> &Path {
        &self.parsed_log_path
    }

    /// Queue a line. Never blocks.
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Block until every line queued before this call is on disk.
    pub fn flush_blocking(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }

    /// Async barrier: all lines queued before this call are on disk when it returns.
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let collector = self.clone();
        tokio::task::spawn_blocking(move || collector.flush_blocking())
            .await
            .map_err(|e| format!("Flush task failed: {}", e))?
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        // Target-aware routing: "parsed" marks high-level milestones
        let line = if record.target() == "parsed" {
            LogLine::parsed(record.level(), message)
        } else {
            LogLine::new(record.level(), message)
        };
        self.log_line(line);
    }

    fn flush(&self) {
        let _ = self.flush_blocking();
    }
}

fn open_append(path: &Path) -> Result<File, String> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))
}
