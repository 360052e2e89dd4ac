//! Falsification Tests: launchd adapter
//!
//! # Toyota Way: Jidoka (自働化)
//! Stop immediately when a falsification test fails.

use sysservice_core::{CommandOutput, PlatformAdapter, ServiceError, ServiceStatus};
use sysservice_test::{SandboxHarness, ScriptedRunner};

fn sandbox(runner: ScriptedRunner) -> SandboxHarness {
    SandboxHarness::new().unwrap().with_runner(runner)
}

/// Claim: install without start writes the plist and the log directory and
/// runs no launchctl command.
#[tokio::test]
async fn install_writes_plist_only() {
    let harness = sandbox(ScriptedRunner::new());
    let adapter = harness.launchd();

    adapter.install(false).await.unwrap();

    let plist = std::fs::read_to_string(harness.plist_path()).unwrap();
    assert!(plist.contains("<string>com.myservice</string>"));
    assert!(plist.contains("<string>run</string>"));
    assert!(harness.home().join("Library/Logs/MyService").is_dir());
    assert!(harness.runner().calls().is_empty());
}

/// Claim: install then exists is true; uninstall then exists is false.
#[tokio::test]
async fn install_uninstall_round_trip() {
    let harness = sandbox(ScriptedRunner::new());
    let adapter = harness.launchd();

    assert!(!adapter.exists().await);
    adapter.install(false).await.unwrap();
    assert!(adapter.exists().await);
    adapter.uninstall().await.unwrap();
    assert!(!adapter.exists().await);
}

/// Claim: install(true) loads the written plist with `launchctl load -w`.
#[tokio::test]
async fn install_and_start_loads_plist() {
    let harness = sandbox(ScriptedRunner::new());
    harness.launchd().install(true).await.unwrap();

    let expected = format!("launchctl load -w {}", harness.plist_path().display());
    assert_eq!(harness.runner().calls(), vec![expected]);
}

/// Claim: start on a missing plist installs it and loads exactly once more.
#[tokio::test]
async fn start_installs_missing_plist() {
    let harness = sandbox(ScriptedRunner::new().on_sequence(
        "launchctl load",
        vec![
            CommandOutput::failure(0, "/tmp/x.plist: No such file or directory"),
            CommandOutput::success(""),
        ],
    ));
    let adapter = harness.launchd();

    adapter.start().await.unwrap();

    assert!(adapter.exists().await);
    assert_eq!(harness.runner().calls_matching("launchctl load").len(), 2);
}

/// Claim: the retry after installing does not loop; its failure is returned.
#[tokio::test]
async fn start_retry_failure_is_returned() {
    let harness = sandbox(ScriptedRunner::new().on_sequence(
        "launchctl load",
        vec![
            CommandOutput::failure(0, "No such file or directory"),
            CommandOutput::failure(1, "Load failed: 5: Input/output error"),
        ],
    ));

    let err = harness.launchd().start().await.unwrap_err();
    assert!(err.to_string().contains("Input/output error"));
    assert_eq!(harness.runner().calls_matching("launchctl load").len(), 2);
}

/// Claim: "service already loaded" is success.
#[tokio::test]
async fn start_already_loaded_succeeds() {
    let harness = sandbox(
        ScriptedRunner::new().on("launchctl load", CommandOutput::failure(0, "service already loaded")),
    );
    harness.launchd().start().await.unwrap();
}

/// Claim: other load failures surface as command errors.
#[tokio::test]
async fn start_other_failure_propagates() {
    let harness = sandbox(
        ScriptedRunner::new().on("launchctl load", CommandOutput::failure(1, "Operation not permitted")),
    );
    let err = harness.launchd().start().await.unwrap_err();
    assert!(matches!(err, ServiceError::Command { .. }));
}

/// Claim: stopping twice succeeds both times.
#[tokio::test]
async fn stop_is_idempotent() {
    let harness = sandbox(ScriptedRunner::new().on_sequence(
        "launchctl unload",
        vec![
            CommandOutput::success(""),
            CommandOutput::failure(0, "Could not find specified service"),
        ],
    ));
    let adapter = harness.launchd();

    adapter.stop().await.unwrap();
    adapter.stop().await.unwrap();
    assert_eq!(harness.runner().calls_matching("launchctl unload -w").len(), 2);
}

/// Claim: stopping with no plist on disk succeeds.
#[tokio::test]
async fn stop_without_plist_succeeds() {
    let harness = sandbox(ScriptedRunner::new().on(
        "launchctl unload",
        CommandOutput::failure(0, "/Users/x/Library/LaunchAgents/com.myservice.plist: No such file or directory"),
    ));
    harness.launchd().stop().await.unwrap();
}

/// Claim: uninstalling a never-installed service succeeds.
#[tokio::test]
async fn uninstall_never_installed_succeeds() {
    let harness = sandbox(
        ScriptedRunner::new().on("launchctl unload", CommandOutput::failure(0, "No such file or directory")),
    );
    let adapter = harness.launchd();
    adapter.uninstall().await.unwrap();
    adapter.uninstall().await.unwrap();
    assert!(!adapter.exists().await);
}

/// Claim: uninstall tolerates launchctl exiting 3 and still removes the plist.
#[tokio::test]
async fn uninstall_tolerates_exit_status_3() {
    let harness = sandbox(ScriptedRunner::new().on(
        "launchctl unload",
        CommandOutput {
            status: Some(3),
            ..CommandOutput::default()
        },
    ));
    let adapter = harness.launchd();
    adapter.install(false).await.unwrap();
    adapter.uninstall().await.unwrap();
    assert!(!adapter.exists().await);
}

/// Claim: uninstall aborts on other stop failures and keeps the plist.
#[tokio::test]
async fn uninstall_aborts_on_stop_failure() {
    let harness = sandbox(
        ScriptedRunner::new().on("launchctl unload", CommandOutput::failure(1, "Operation not permitted")),
    );
    let adapter = harness.launchd();
    adapter.install(false).await.unwrap();
    assert!(adapter.uninstall().await.is_err());
    assert!(adapter.exists().await);
}

/// Claim: a listed PID yields a running status.
#[tokio::test]
async fn status_running_from_listing() {
    let harness = sandbox(ScriptedRunner::new().on(
        "launchctl list",
        CommandOutput::success("PID\tStatus\tLabel\n1234\t0\tcom.myservice\n"),
    ));
    assert_eq!(
        harness.launchd().status().await.unwrap(),
        ServiceStatus::new(true, 1234)
    );
}

/// Claim: a `-` PID yields a stopped status.
#[tokio::test]
async fn status_stopped_from_listing() {
    let harness = sandbox(
        ScriptedRunner::new().on("launchctl list", CommandOutput::success("-\t0\tcom.myservice\n")),
    );
    assert_eq!(harness.launchd().status().await.unwrap(), ServiceStatus::default());
}

/// Claim: status ignores warnings on stderr but fails on a nonzero exit.
#[tokio::test]
async fn status_exit_code_decides_failure() {
    let harness = sandbox(ScriptedRunner::new().on(
        "launchctl list",
        CommandOutput {
            status: Some(0),
            stdout: "77\t0\tcom.myservice\n".into(),
            stderr: "warning: something".into(),
        },
    ));
    assert_eq!(harness.launchd().status().await.unwrap().pid, 77);

    let harness = sandbox(
        ScriptedRunner::new().on("launchctl list", CommandOutput::failure(1, "boom")),
    );
    assert!(harness.launchd().status().await.is_err());
}

/// Claim: restart stops then starts; a failed stop skips the start.
#[tokio::test]
async fn restart_failure_propagation() {
    let harness = sandbox(ScriptedRunner::new());
    harness.launchd().restart().await.unwrap();
    let calls = harness.runner().calls();
    assert!(calls[0].starts_with("launchctl unload"));
    assert!(calls[1].starts_with("launchctl load"));

    let harness = sandbox(
        ScriptedRunner::new().on("launchctl unload", CommandOutput::failure(1, "Operation not permitted")),
    );
    assert!(harness.launchd().restart().await.is_err());
    assert!(harness.runner().calls_matching("launchctl load").is_empty());
}

/// Claim: run returns immediately without touching launchctl.
#[tokio::test]
async fn run_is_a_no_op() {
    let harness = sandbox(ScriptedRunner::new());
    harness.launchd().run().await.unwrap();
    assert!(harness.runner().calls().is_empty());
}
