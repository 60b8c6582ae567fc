//! OS process capability.
//!
//! `ProcessControl` is the only place the engine touches the process table.
//! Both operations are fire-and-forget: `Ok(())` means the request was handed
//! to the OS, not that a matching process existed. Callers bound every call
//! with a timeout.

use crate::models::PriorityLevel;
use futures::future::BoxFuture;
use std::io;

/// Narrow interface over the host's process table.
pub trait ProcessControl: Send + Sync {
    /// Change the scheduling priority of every process named `base_name`.
    fn set_priority<'a>(&'a self, base_name: &'a str, level: PriorityLevel) -> BoxFuture<'a, io::Result<()>>;

    /// Forcefully end every process named `name`.
    fn terminate<'a>(&'a self, name: &'a str) -> BoxFuture<'a, io::Result<()>>;
}

/// `ProcessControl` backed by the host OS.
///
/// Windows uses `powershell` and `taskkill`. On Unix both operations look
/// processes up with `sysinfo` by extension-stripped name, so `Game.exe`
/// under Wine matches either way. Niceness is set absolutely with
/// `setpriority(2)` and processes are killed with `SIGKILL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl SystemProcessControl {
    pub fn new() -> Self {
        SystemProcessControl
    }
}

impl ProcessControl for SystemProcessControl {
    fn set_priority<'a>(&'a self, base_name: &'a str, level: PriorityLevel) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(platform::set_priority(base_name, level))
    }

    fn terminate<'a>(&'a self, name: &'a str) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(platform::terminate(name))
    }
}

#[cfg(windows)]
mod platform {
    use crate::models::PriorityLevel;
    use std::io;
    use std::process::Stdio;
    use tokio::process::Command;

    pub(super) async fn set_priority(base_name: &str, level: PriorityLevel) -> io::Result<()> {
        let script = format!(
            "Get-Process -Name '{}' -ErrorAction SilentlyContinue | ForEach-Object {{ $_.PriorityClass = '{}' }}",
            base_name,
            level.label()
        );
        run("powershell", &["-NoProfile", "-NonInteractive", "-Command", &script]).await
    }

    pub(super) async fn terminate(name: &str) -> io::Result<()> {
        run("taskkill", &["/F", "/IM", name]).await
    }

    /// Spawn `program` and wait for it to exit.
    ///
    /// A non-zero exit is logged but not an error: "no such process" is a
    /// normal answer for a fire-and-forget request.
    pub(super) async fn run(program: &str, args: &[&str]) -> io::Result<()> {
        log::debug!("[Process] Running: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            log::debug!(
                "[Process] {} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[cfg(unix)]
mod platform {
    use crate::models::PriorityLevel;
    use crate::process::base_process_name;
    use std::io;
    use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};

    pub(super) async fn set_priority(base_name: &str, level: PriorityLevel) -> io::Result<()> {
        let base = base_name.to_string();
        tokio::task::spawn_blocking(move || renice(&base, level.niceness()))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    pub(super) async fn terminate(name: &str) -> io::Result<()> {
        let base = base_process_name(name).to_string();
        tokio::task::spawn_blocking(move || kill(&base))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    /// Set the niceness of every match to `niceness`.
    ///
    /// Fails only when no match could be changed.
    fn renice(base_name: &str, niceness: i32) -> io::Result<()> {
        let pids = find_pids(base_name);
        if pids.is_empty() {
            log::debug!("[Process] [PRIORITY] No running process named '{}'", base_name);
            return Ok(());
        }

        let mut failures = Vec::new();
        for pid in &pids {
            // Absolute value: repeating a request never drifts further
            let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS, pid.as_u32() as libc::id_t, niceness) };
            if ret != 0 {
                let err = io::Error::last_os_error();
                log::debug!("[Process] [PRIORITY] setpriority({}, {}) failed: {}", pid, niceness, err);
                failures.push(err);
            }
        }

        if failures.len() == pids.len() {
            if let Some(err) = failures.pop() {
                return Err(err);
            }
        }
        log::debug!(
            "[Process] [PRIORITY] {}/{} process(es) now at niceness {}",
            pids.len() - failures.len(),
            pids.len(),
            niceness
        );
        Ok(())
    }

    /// Send `SIGKILL` to every match.
    ///
    /// Fails only when matches existed and none could be signalled.
    fn kill(base_name: &str) -> io::Result<()> {
        let system = snapshot();
        let mut matched = 0;
        let mut signalled = 0;
        for process in matching(&system, base_name) {
            matched += 1;
            let sent = process
                .kill_with(Signal::Kill)
                .unwrap_or_else(|| process.kill());
            if sent {
                signalled += 1;
            } else {
                log::debug!("[Process] [TERMINATE] Could not signal pid {}", process.pid());
            }
        }

        if matched == 0 {
            log::debug!("[Process] [TERMINATE] No running process named '{}'", base_name);
        }
        if matched > 0 && signalled == 0 {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("could not signal any of {} process(es) named '{}'", matched, base_name),
            ));
        }
        Ok(())
    }

    fn snapshot() -> System {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        system
    }

    /// Processes (not threads) whose name, extension ignored, equals
    /// `base_name`. The engine's own process never matches.
    fn matching<'a>(system: &'a System, base_name: &'a str) -> impl Iterator<Item = &'a Process> + 'a {
        let own = sysinfo::get_current_pid().ok();
        system.processes().values().filter(move |process| {
            let name = process.name().to_string_lossy();
            process.thread_kind().is_none()
                && Some(process.pid()) != own
                && base_process_name(&name).eq_ignore_ascii_case(base_name)
        })
    }

    pub(super) fn find_pids(base_name: &str) -> Vec<Pid> {
        let system = snapshot();
        let mut pids: Vec<Pid> = matching(&system, base_name).map(Process::pid).collect();
        pids.sort();
        pids
    }
}
