//! Falsification Tests: lifecycle facade
//!
//! # Toyota Way: Standardized Work (標準作業)
//! The facade adds validation and logging, nothing else.

use sysservice_core::{CommandOutput, Platform, ServiceDescriptor, ServiceStatus};
use sysservice_test::{LogCapture, SandboxHarness, ScriptedRunner, TestError};

/// Claim: the facade delegates the whole lifecycle to its adapter.
#[tokio::test]
async fn full_lifecycle_through_facade() {
    let harness = SandboxHarness::new().unwrap().with_runner(
        ScriptedRunner::new()
            .on("systemctl --user is-active", CommandOutput::success("active\n"))
            .on("systemctl --user status", CommandOutput::success("Main PID: 99 (myservice)\n")),
    );
    let service = harness.systemd_service().unwrap();
    assert_eq!(service.platform(), Platform::Linux);
    assert_eq!(service.platform().manager(), "systemd");

    service.install(true).await.unwrap();
    assert!(service.exists().await);
    assert_eq!(service.status().await.unwrap(), ServiceStatus::new(true, 99));
    service.restart().await.unwrap();
    service.stop().await.unwrap();
    service.uninstall().await.unwrap();
    assert!(!service.exists().await);
    service.run().await.unwrap();
}

/// Claim: log output goes to the injected dispatch.
#[tokio::test]
async fn logs_go_to_injected_dispatch() {
    let harness = SandboxHarness::new().unwrap();
    let capture = LogCapture::new();
    let service = harness
        .launchd_service()
        .unwrap()
        .with_logger(capture.dispatch());

    service.install(false).await.unwrap();

    let logs = capture.contents();
    assert!(logs.contains("wrote plist"));
    assert!(logs.contains("com.myservice"));
}

/// Claim: two facades with different loggers do not share output.
#[tokio::test]
async fn loggers_are_per_instance() {
    let harness = SandboxHarness::new().unwrap();
    let first = LogCapture::new();
    let second = LogCapture::new();

    let a = harness.systemd_service().unwrap().with_logger(first.dispatch());
    let _b = harness.systemd_service().unwrap().with_logger(second.dispatch());

    a.start().await.unwrap();

    assert!(first.contents().contains("starting unit with systemd"));
    assert!(second.contents().is_empty());
}

/// Claim: invalid descriptors never reach the adapter.
#[test]
fn invalid_descriptor_rejected() {
    let harness = SandboxHarness::new()
        .unwrap()
        .with_descriptor(ServiceDescriptor::new("svc", "", "/bin/svc"));
    assert!(matches!(harness.launchd_service(), Err(TestError::Service(_))));
    assert!(harness.runner().calls().is_empty());
}

/// Claim: status of a never-installed service is a zero status, not an error.
#[tokio::test]
async fn status_of_unknown_service_is_zero() {
    let harness = SandboxHarness::new().unwrap().with_runner(
        ScriptedRunner::new().on("launchctl list", CommandOutput::success("-\t0\tcom.apple.other\n")),
    );
    let service = harness.launchd_service().unwrap();
    assert_eq!(service.platform().manager(), "launchd");
    assert_eq!(service.status().await.unwrap(), ServiceStatus::default());
}
