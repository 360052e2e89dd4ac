//! Linux systemd adapter implementation.
//!
//! Manages a unit file and drives it with `systemctl`. Non-root users manage
//! units in their user instance (`systemctl --user`); root manages system
//! units in `/etc/systemd/system`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::{Platform, PlatformAdapter};
use crate::config::ServiceDescriptor;
use crate::env::{EnvFacts, file_exists};
use crate::error::{Result, ServiceError};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use crate::template::{Artifact, UnitFile, remove_artifact, write_artifact};
use crate::types::ServiceStatus;

const SYSTEMCTL: &str = "systemctl";

/// Outcome classes of a failed `systemctl` invocation.
///
/// `systemctl enable`/`disable` report the symlinks they touch on stderr, so
/// a successful call can surface as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemctlError {
    /// `enable` created its symlink.
    SymlinkCreated,
    /// `disable` removed its symlink.
    SymlinkRemoved,
    /// The unit is not loaded or its file does not exist.
    NotLoaded,
    /// Anything else.
    Other,
}

/// Classifies a `systemctl` failure by its diagnostic text.
#[must_use]
pub fn classify_systemctl(err: &ServiceError) -> SystemctlError {
    let Some(text) = err.diagnostic() else {
        return SystemctlError::Other;
    };
    if text.contains("created symlink") {
        SystemctlError::SymlinkCreated
    } else if text.contains("removed") {
        SystemctlError::SymlinkRemoved
    } else if text.contains("not loaded") || text.contains("does not exist") {
        SystemctlError::NotLoaded
    } else {
        SystemctlError::Other
    }
}

/// Linux systemd adapter.
///
/// # Example
///
/// ```rust,ignore
/// use sysservice_core::adapters::SystemdAdapter;
/// use sysservice_core::{EnvFacts, PlatformAdapter, ServiceDescriptor};
///
/// let desc = ServiceDescriptor::new("agent", "agent", "/usr/local/bin/agent");
/// let adapter = SystemdAdapter::new(desc.into(), EnvFacts::detect());
/// adapter.install(true).await?;
/// ```
pub struct SystemdAdapter {
    descriptor: Arc<ServiceDescriptor>,
    env: EnvFacts,
    runner: Arc<dyn CommandRunner>,
}

impl SystemdAdapter {
    /// Creates an adapter that runs the real `systemctl`.
    #[must_use]
    pub fn new(descriptor: Arc<ServiceDescriptor>, env: EnvFacts) -> Self {
        Self::with_runner(descriptor, env, Arc::new(SystemRunner))
    }

    /// Creates an adapter with a custom command runner.
    #[must_use]
    pub fn with_runner(
        descriptor: Arc<ServiceDescriptor>,
        env: EnvFacts,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            descriptor,
            env,
            runner,
        }
    }

    /// The unit for the current descriptor and environment.
    #[must_use]
    pub fn unit(&self) -> UnitFile {
        UnitFile::new(&self.descriptor, &self.env)
    }

    /// Arguments for `systemctl <verb> <label>`, scoped to the user instance
    /// unless elevated.
    fn systemctl_args(&self, verb: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if !self.env.is_elevated() {
            args.push("--user".to_string());
        }
        args.push(verb.to_string());
        args.push(self.descriptor.label.clone());
        args
    }

    async fn systemctl(&self, verb: &str) -> Result<CommandOutput> {
        self.runner.run(SYSTEMCTL, &self.systemctl_args(verb)).await
    }

    async fn systemctl_checked(&self, verb: &str) -> Result<String> {
        self.runner
            .run_checked(SYSTEMCTL, &self.systemctl_args(verb))
            .await
    }

    /// Extracts the main PID from `systemctl status` output.
    ///
    /// Looks for a line like `Main PID: 1234 (agent)`; returns 0 when absent
    /// or unparseable.
    #[must_use]
    pub fn parse_main_pid(output: &str) -> u32 {
        output
            .lines()
            .find_map(|line| line.split_once("Main PID:"))
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .and_then(|token| token.parse().ok())
            .unwrap_or(0)
    }
}

#[async_trait]
impl PlatformAdapter for SystemdAdapter {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn install(&self, start: bool) -> Result<()> {
        let unit = self.unit();
        let path = write_artifact(&unit).await?;
        tracing::info!(label = %unit.label(), path = %path.display(), "wrote unit file");

        if start {
            self.start().await?;
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let label = &self.descriptor.label;

        tracing::info!(label = %label, "starting unit with systemd");
        self.systemctl_checked("start").await?;

        tracing::info!(label = %label, "enabling unit with systemd");
        match self.systemctl_checked("enable").await {
            Ok(_) => Ok(()),
            Err(e) if classify_systemctl(&e) == SystemctlError::SymlinkCreated => {
                tracing::debug!(label = %label, "enable created symlink");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn stop(&self) -> Result<()> {
        let label = &self.descriptor.label;

        tracing::info!(label = %label, "stopping unit with systemd");
        match self.systemctl_checked("stop").await {
            Ok(_) => {}
            Err(e) if classify_systemctl(&e) == SystemctlError::NotLoaded => {
                tracing::info!(label = %label, "unit not loaded, nothing to stop");
            }
            Err(e) => return Err(e),
        }

        tracing::info!(label = %label, "disabling unit with systemd");
        match self.systemctl_checked("disable").await {
            Ok(_) => Ok(()),
            Err(e) => match classify_systemctl(&e) {
                SystemctlError::SymlinkRemoved => {
                    tracing::debug!(label = %label, "ignoring removed symlink notice");
                    Ok(())
                }
                SystemctlError::NotLoaded => {
                    tracing::info!(label = %label, "unit file absent, nothing to disable");
                    Ok(())
                }
                _ => Err(e),
            },
        }
    }

    async fn restart(&self) -> Result<()> {
        tracing::info!(label = %self.descriptor.label, "reloading or restarting unit");
        self.systemctl_checked("reload-or-restart").await?;
        Ok(())
    }

    async fn uninstall(&self) -> Result<()> {
        self.stop().await?;

        let unit = self.unit();
        tracing::info!(label = %unit.label(), "removing unit file");
        remove_artifact(&unit.path()).await
    }

    async fn status(&self) -> Result<ServiceStatus> {
        // `is-active` exits nonzero for anything but an active unit; the state
        // word on stdout is all that matters.
        let active = self.systemctl("is-active").await?;
        if active.stdout.trim() != "active" {
            return Ok(ServiceStatus::default());
        }

        let status = self.systemctl("status").await?;
        let pid = Self::parse_main_pid(&status.stdout);
        if pid == 0 {
            tracing::debug!(label = %self.descriptor.label, "active unit reported no main pid");
        }

        Ok(ServiceStatus::new(true, pid))
    }

    async fn exists(&self) -> bool {
        file_exists(&self.unit().path())
    }
}
