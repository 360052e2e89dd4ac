//! Falsification Tests: systemd adapter
//!
//! # Toyota Way: Jidoka (自働化)
//! Stop immediately when a falsification test fails.

use sysservice_core::{CommandOutput, PlatformAdapter, ServiceStatus};
use sysservice_test::{SandboxHarness, ScriptedRunner};

fn sandbox(runner: ScriptedRunner) -> SandboxHarness {
    SandboxHarness::new().unwrap().with_runner(runner)
}

const STATUS_BLOCK: &str = "\
● com.myservice.service - My systemservice test!
     Loaded: loaded (/home/tester/.config/systemd/user/com.myservice.service; enabled)
     Active: active (running) since Mon 2024-01-01 00:00:00 UTC; 5s ago
   Main PID: 5678 (sleep)
      Tasks: 1
";

/// Claim: install writes the unit file with the rendered command line.
#[tokio::test]
async fn install_writes_unit_file() {
    let harness = sandbox(ScriptedRunner::new());
    harness.systemd().install(false).await.unwrap();

    let unit = std::fs::read_to_string(harness.unit_path()).unwrap();
    assert!(unit.contains("ExecStart=/usr/local/bin/myservice run\n"));
    assert!(unit.contains("Description=My systemservice test!\n"));
    assert!(harness.runner().calls().is_empty());
}

/// Claim: install then exists is true; uninstall then exists is false.
#[tokio::test]
async fn install_uninstall_round_trip() {
    let harness = sandbox(ScriptedRunner::new());
    let adapter = harness.systemd();

    adapter.install(false).await.unwrap();
    assert!(adapter.exists().await);
    adapter.uninstall().await.unwrap();
    assert!(!adapter.exists().await);
}

/// Claim: start runs `start` then `enable`, scoped to the user instance.
#[tokio::test]
async fn start_then_enable() {
    let harness = sandbox(ScriptedRunner::new());
    harness.systemd().start().await.unwrap();
    assert_eq!(
        harness.runner().calls(),
        vec![
            "systemctl --user start com.myservice",
            "systemctl --user enable com.myservice",
        ]
    );
}

/// Claim: enable's "Created symlink" notice is success.
#[tokio::test]
async fn enable_symlink_notice_is_success() {
    let harness = sandbox(ScriptedRunner::new().on(
        "systemctl --user enable",
        CommandOutput::failure(
            0,
            "Created symlink /home/tester/.config/systemd/user/multi-user.target.wants/com.myservice.service → /home/tester/.config/systemd/user/com.myservice.service.",
        ),
    ));
    harness.systemd().start().await.unwrap();
}

/// Claim: a failed `start` skips `enable`.
#[tokio::test]
async fn failed_start_skips_enable() {
    let harness = sandbox(ScriptedRunner::new().on(
        "systemctl --user start",
        CommandOutput::failure(1, "Job for com.myservice.service failed."),
    ));
    assert!(harness.systemd().start().await.is_err());
    assert!(harness.runner().calls_matching("systemctl --user enable").is_empty());
}

/// Claim: stop runs `stop` then `disable`; "Removed" notices are success.
#[tokio::test]
async fn stop_then_disable() {
    let harness = sandbox(ScriptedRunner::new().on(
        "systemctl --user disable",
        CommandOutput::failure(0, "Removed /home/tester/.config/systemd/user/multi-user.target.wants/com.myservice.service."),
    ));
    harness.systemd().stop().await.unwrap();
    assert_eq!(
        harness.runner().calls(),
        vec![
            "systemctl --user stop com.myservice",
            "systemctl --user disable com.myservice",
        ]
    );
}

/// Claim: stopping twice succeeds; the second call only sees "not loaded".
#[tokio::test]
async fn stop_is_idempotent() {
    let harness = sandbox(
        ScriptedRunner::new()
            .on_sequence(
                "systemctl --user stop",
                vec![
                    CommandOutput::success(""),
                    CommandOutput::failure(5, "Failed to stop com.myservice.service: Unit com.myservice.service not loaded."),
                ],
            )
            .on_sequence(
                "systemctl --user disable",
                vec![
                    CommandOutput::failure(0, "Removed /home/tester/.config/systemd/user/multi-user.target.wants/com.myservice.service."),
                    CommandOutput::failure(1, "Failed to disable unit: Unit file com.myservice.service does not exist."),
                ],
            ),
    );
    let adapter = harness.systemd();
    adapter.stop().await.unwrap();
    adapter.stop().await.unwrap();
}

/// Claim: uninstalling a never-installed unit succeeds.
#[tokio::test]
async fn uninstall_never_installed_succeeds() {
    let harness = sandbox(
        ScriptedRunner::new()
            .on("systemctl --user stop", CommandOutput::failure(5, "Unit com.myservice.service not loaded."))
            .on("systemctl --user disable", CommandOutput::failure(1, "Unit file com.myservice.service does not exist.")),
    );
    harness.systemd().uninstall().await.unwrap();
}

/// Claim: restart is a single `reload-or-restart`.
#[tokio::test]
async fn restart_is_single_command() {
    let harness = sandbox(ScriptedRunner::new());
    harness.systemd().restart().await.unwrap();
    assert_eq!(
        harness.runner().calls(),
        vec!["systemctl --user reload-or-restart com.myservice"]
    );
}

/// Claim: an active unit reports the main PID.
#[tokio::test]
async fn status_active_with_pid() {
    let harness = sandbox(
        ScriptedRunner::new()
            .on("systemctl --user is-active", CommandOutput::success("active\n"))
            .on("systemctl --user status", CommandOutput::success(STATUS_BLOCK)),
    );
    assert_eq!(
        harness.systemd().status().await.unwrap(),
        ServiceStatus::new(true, 5678)
    );
}

/// Claim: an inactive unit is not running and `status` is never invoked.
#[tokio::test]
async fn status_inactive_skips_status() {
    let harness = sandbox(ScriptedRunner::new().on(
        "systemctl --user is-active",
        CommandOutput {
            status: Some(3),
            stdout: "inactive\n".into(),
            stderr: String::new(),
        },
    ));
    assert_eq!(harness.systemd().status().await.unwrap(), ServiceStatus::default());
    assert!(harness.runner().calls_matching("systemctl --user status").is_empty());
}

/// Claim: an active unit without a main PID still counts as running.
#[tokio::test]
async fn status_active_without_pid() {
    let harness = sandbox(
        ScriptedRunner::new()
            .on("systemctl --user is-active", CommandOutput::success("active\n"))
            .on("systemctl --user status", CommandOutput::success("Active: active (exited)\n")),
    );
    assert_eq!(
        harness.systemd().status().await.unwrap(),
        ServiceStatus::new(true, 0)
    );
}

/// Claim: a tool that cannot be launched is an error, not a stopped status.
#[tokio::test]
async fn status_spawn_failure_propagates() {
    let harness = sandbox(ScriptedRunner::new().fail_spawn("systemctl"));
    assert!(harness.systemd().status().await.is_err());
}
