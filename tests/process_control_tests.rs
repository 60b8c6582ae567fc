//! Integration tests for priority changes and termination
//!
//! A recording `ProcessControl` stands in for the OS so the tests can
//! count dispatched requests and simulate hangs and failures.

use futures::future::BoxFuture;
use game_tuner::config::EngineSettings;
use game_tuner::models::PriorityLevel;
use game_tuner::{EngineController, ErrorKind, ProcessControl};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Priority(String, PriorityLevel),
    Terminate(String),
}

/// Fake process table. Names listed in `hang` never answer, names in
/// `fail` answer with an error.
#[derive(Default)]
struct RecordingControl {
    calls: Mutex<Vec<Call>>,
    hang: Vec<String>,
    fail: Vec<String>,
}

impl RecordingControl {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, name: &str) -> io::Result<()> {
        if self.hang.iter().any(|h| h == name) {
            futures::future::pending::<()>().await;
        }
        if self.fail.iter().any(|f| f == name) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        Ok(())
    }
}

impl ProcessControl for RecordingControl {
    fn set_priority<'a>(&'a self, base_name: &'a str, level: PriorityLevel) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Priority(base_name.to_string(), level));
            self.answer(base_name).await
        })
    }

    fn terminate<'a>(&'a self, name: &'a str) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Terminate(name.to_string()));
            self.answer(name).await
        })
    }
}

fn controller_with(control: Arc<RecordingControl>, timeout_ms: u64) -> EngineController {
    let settings = EngineSettings {
        command_timeout_ms: timeout_ms,
        ..EngineSettings::default()
    };
    EngineController::with_process_control(settings, control)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Priority
// ============================================================================

#[tokio::test]
async fn test_priority_strips_extension() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    let outcome = controller.set_process_priority("Game.exe", "High").await;

    assert!(outcome.success);
    assert_eq!(
        control.calls(),
        vec![Call::Priority("Game".to_string(), PriorityLevel::High)]
    );
}

#[tokio::test]
async fn test_priority_labels_are_case_insensitive() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    assert!(controller.set_process_priority("Game", "belownormal").await.success);
    assert_eq!(
        control.calls(),
        vec![Call::Priority("Game".to_string(), PriorityLevel::BelowNormal)]
    );
}

#[tokio::test]
async fn test_unknown_priority_issues_no_os_call() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    let outcome = controller.set_process_priority("Game.exe", "Ultra").await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, Some(ErrorKind::InvalidArgument));
    assert!(control.calls().is_empty());
}

#[tokio::test]
async fn test_empty_process_name_issues_no_os_call() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    for name in ["  ", "a'; rm -rf /"] {
        let outcome = controller.set_process_priority(name, "High").await;
        assert!(!outcome.success);
        assert_eq!(outcome.kind, Some(ErrorKind::InvalidArgument));
    }
    let outcome = controller.terminate_processes(&["a'; rm -rf /".to_string()]).await;
    assert_eq!(outcome.kind, Some(ErrorKind::InvalidArgument));
    assert!(control.calls().is_empty());
}

#[tokio::test]
async fn test_priority_timeout_is_a_failure() {
    let control = Arc::new(RecordingControl {
        hang: names(&["Game"]),
        ..RecordingControl::default()
    });
    let controller = controller_with(control.clone(), 50);

    let outcome = controller.set_process_priority("Game.exe", "High").await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, Some(ErrorKind::ProcessCommandFailed));
    assert!(outcome.detail.unwrap().contains("timed out after 50ms"));
}

#[tokio::test]
async fn test_priority_dispatch_error_is_a_failure() {
    let control = Arc::new(RecordingControl {
        fail: names(&["Game"]),
        ..RecordingControl::default()
    });
    let controller = controller_with(control, 1000);

    let outcome = controller.set_process_priority("Game.exe", "Idle").await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, Some(ErrorKind::ProcessCommandFailed));
    assert!(outcome.detail.unwrap().contains("access denied"));
}

// ============================================================================
// Termination
// ============================================================================

#[tokio::test]
async fn test_terminate_empty_list_issues_no_os_call() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    let outcome = controller.terminate_processes(&[]).await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, Some(ErrorKind::InvalidArgument));
    assert!(control.calls().is_empty());
}

#[tokio::test]
async fn test_terminate_dispatches_one_request_per_name() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    let outcome = controller
        .terminate_processes(&names(&["chrome.exe", "discord.exe"]))
        .await;

    assert!(outcome.success);
    assert_eq!(
        control.calls(),
        vec![
            Call::Terminate("chrome.exe".to_string()),
            Call::Terminate("discord.exe".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_terminate_failures_do_not_stop_the_rest() {
    let control = Arc::new(RecordingControl {
        hang: names(&["stuck.exe"]),
        fail: names(&["locked.exe"]),
        ..RecordingControl::default()
    });
    let controller = controller_with(control.clone(), 50);

    let outcome = controller
        .terminate_processes(&names(&["stuck.exe", "locked.exe", "ok.exe"]))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, Some(ErrorKind::ProcessCommandFailed));
    let detail = outcome.detail.unwrap();
    assert!(detail.contains("stuck.exe"));
    assert!(detail.contains("locked.exe"));
    assert!(!detail.contains("ok.exe"));
    assert_eq!(control.calls().len(), 3);
}

// ============================================================================
// Emergency optimisation
// ============================================================================

#[tokio::test]
async fn test_emergency_raises_and_kills() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    let outcome = controller
        .emergency_optimize("Bloodstrike.exe", &names(&["chrome.exe"]))
        .await;

    assert!(outcome.success);
    assert!(outcome.kind.is_none());
    assert!(outcome.detail.is_none());
    assert_eq!(
        control.calls(),
        vec![
            Call::Priority("Bloodstrike".to_string(), PriorityLevel::High),
            Call::Terminate("chrome.exe".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_emergency_without_kill_list_only_raises() {
    let control = Arc::new(RecordingControl::default());
    let controller = controller_with(control.clone(), 1000);

    assert!(controller.emergency_optimize("Bloodstrike.exe", &[]).await.success);
    assert_eq!(control.calls().len(), 1);
}

#[tokio::test]
async fn test_emergency_reports_both_halves() {
    let control = Arc::new(RecordingControl {
        fail: names(&["Bloodstrike"]),
        ..RecordingControl::default()
    });
    let controller = controller_with(control.clone(), 1000);

    let outcome = controller
        .emergency_optimize("Bloodstrike.exe", &names(&["chrome.exe"]))
        .await;

    assert!(!outcome.success);
    assert!(outcome.detail.unwrap().starts_with("priority:"));
    // Termination still went out
    assert_eq!(control.calls().len(), 2);
}

#[tokio::test]
async fn test_timeout_uses_configured_bound() {
    let control = Arc::new(RecordingControl {
        hang: names(&["slow.exe"]),
        ..RecordingControl::default()
    });
    let controller = controller_with(control, 30);

    let started = std::time::Instant::now();
    let outcome = controller.terminate_processes(&names(&["slow.exe"])).await;

    assert!(!outcome.success);
    assert!(started.elapsed() < Duration::from_secs(5));
}
