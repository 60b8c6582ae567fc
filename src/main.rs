use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use game_tuner::config::SettingsManager;
use game_tuner::log_collector::get_global_logs_path;
use game_tuner::orchestrator::PatchOptions;
use game_tuner::{EngineController, OverrideSet, PatchError};

#[derive(Parser, Debug)]
#[command(name = "game-tuner", version, about = "Safe game config patching and process control")]
struct Cli {
    /// Engine settings file (defaults to ~/.config/game-tuner/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Record debug logs and echo them to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for session logs (defaults to ./logs)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look for the game in its usual install locations
    Detect,
    /// Apply overrides to every config file next to the executable
    Apply {
        /// Path to the game executable
        executable: PathBuf,
        /// Override as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// JSON object of overrides, applied before --set
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Put every config file back from its backup
    Restore {
        executable: PathBuf,
    },
    /// Change a process's priority class
    Priority {
        name: String,
        /// RealTime, High, AboveNormal, Normal, BelowNormal or Idle
        level: String,
    },
    /// Forcefully end processes by name
    Kill {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Raise a process to High and end the listed processes
    Emergency {
        name: String,
        #[arg(long = "kill", value_name = "NAME")]
        kill: Vec<String>,
    },
}

/// Error shape printed on stdout when an operation fails outright.
#[derive(Serialize)]
struct FailureOutput {
    success: bool,
    kind: game_tuner::ErrorKind,
    error: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // =========================================================================
    // LOGGING INITIALIZATION - MUST BE FIRST
    // =========================================================================
    let log_dir = match cli.log_dir.clone() {
        Some(dir) => dir,
        None => get_global_logs_path().map_err(anyhow::Error::msg)?,
    };
    let log_collector = game_tuner::initialize_logging(log_dir, cli.verbose)
        .map_err(anyhow::Error::msg)
        .context("Failed to initialize logging")?;
    log::info!("[Main] Game Tuner {} starting", game_tuner::VERSION);

    let settings = match &cli.settings {
        Some(path) => SettingsManager::load_from(path),
        None => SettingsManager::load(),
    };
    let controller = EngineController::new(settings);

    let ok = run(&controller, cli.command).await;

    if let Err(e) = log_collector.wait_for_empty().await {
        eprintln!("[Main] WARNING: log flush failed: {}", e);
    }

    match ok {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => Err(e),
    }
}

/// Run one subcommand and print its JSON result. `Ok(false)` means the
/// operation ran but failed.
async fn run(controller: &EngineController, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Detect => {
            let result = controller.detect_installation();
            print_json(&result)?;
            Ok(result.found)
        }
        Command::Apply {
            executable,
            set,
            json,
            dry_run,
        } => {
            let overrides = collect_overrides(json.as_deref(), &set)?;
            let options = PatchOptions {
                dry_run,
                cancel: None,
            };
            let result = controller
                .apply_configuration_with(&executable.to_string_lossy(), overrides, options)
                .await;
            report_patch(result)
        }
        Command::Restore { executable } => {
            let result = controller
                .restore_configuration(&executable.to_string_lossy())
                .await;
            report_patch(result)
        }
        Command::Priority { name, level } => {
            let outcome = controller.set_process_priority(&name, &level).await;
            print_json(&outcome)?;
            Ok(outcome.success)
        }
        Command::Kill { names } => {
            let outcome = controller.terminate_processes(&names).await;
            print_json(&outcome)?;
            Ok(outcome.success)
        }
        Command::Emergency { name, kill } => {
            let outcome = controller.emergency_optimize(&name, &kill).await;
            print_json(&outcome)?;
            Ok(outcome.success)
        }
    }
}

fn collect_overrides(json: Option<&std::path::Path>, pairs: &[String]) -> anyhow::Result<OverrideSet> {
    let mut overrides = match json {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read overrides from {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            OverrideSet::from_json(&value)?
        }
        None => OverrideSet::new(),
    };

    for pair in pairs {
        let (key, value) = OverrideSet::parse_pair(pair)?;
        overrides.insert(key, value);
    }

    if overrides.is_empty() {
        bail!("no overrides given; use --set key=value or --json FILE");
    }
    Ok(overrides)
}

fn report_patch(result: Result<game_tuner::PatchReport, PatchError>) -> anyhow::Result<bool> {
    match result {
        Ok(report) => {
            print_json(&report)?;
            Ok(report.all_updated() && !report.cancelled)
        }
        Err(e) => {
            log::error!("[Main] {}", e);
            print_json(&FailureOutput {
                success: false,
                kind: e.kind(),
                error: e.user_message(),
            })?;
            Ok(false)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
