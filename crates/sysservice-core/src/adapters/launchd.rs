//! macOS launchd adapter implementation.
//!
//! Manages a job through a property list and `launchctl load/unload/list`.
//! Agents live in `~/Library/LaunchAgents`, system daemons (when running as
//! root) in `/Library/LaunchDaemons`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::{Platform, PlatformAdapter};
use crate::config::ServiceDescriptor;
use crate::env::{EnvFacts, file_exists};
use crate::error::{Result, ServiceError};
use crate::runner::{CommandRunner, SystemRunner, args};
use crate::template::{Artifact, PropertyList, remove_artifact, write_artifact};
use crate::types::ServiceStatus;

const LAUNCHCTL: &str = "launchctl";

/// Outcome classes of a failed `launchctl` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchctlError {
    /// The plist file is missing.
    NotInstalled,
    /// The job is already loaded.
    AlreadyLoaded,
    /// No loaded job matches the plist.
    NotLoaded,
    /// Anything else.
    Other,
}

/// Classifies a `launchctl` failure by its diagnostic text.
#[must_use]
pub fn classify_launchctl(err: &ServiceError) -> LaunchctlError {
    let Some(text) = err.diagnostic() else {
        return LaunchctlError::Other;
    };
    if text.contains("no such file or directory") {
        LaunchctlError::NotInstalled
    } else if text.contains("service already loaded") {
        LaunchctlError::AlreadyLoaded
    } else if text.contains("could not find specified service") {
        LaunchctlError::NotLoaded
    } else {
        LaunchctlError::Other
    }
}

/// macOS launchd adapter.
///
/// # Example
///
/// ```rust,ignore
/// use sysservice_core::adapters::LaunchdAdapter;
/// use sysservice_core::{EnvFacts, PlatformAdapter, ServiceDescriptor};
///
/// let desc = ServiceDescriptor::new("agent", "com.example.agent", "/usr/local/bin/agent");
/// let adapter = LaunchdAdapter::new(desc.into(), EnvFacts::detect());
/// adapter.install(true).await?;
/// ```
pub struct LaunchdAdapter {
    descriptor: Arc<ServiceDescriptor>,
    env: EnvFacts,
    runner: Arc<dyn CommandRunner>,
}

impl LaunchdAdapter {
    /// Creates an adapter that runs the real `launchctl`.
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

    /// The job definition for the current descriptor and environment.
    #[must_use]
    pub fn plist(&self) -> PropertyList {
        PropertyList::new(&self.descriptor, &self.env)
    }

    async fn write_plist(&self, plist: &PropertyList) -> Result<()> {
        if let Some(log_dir) = plist.log_dir() {
            tokio::fs::create_dir_all(log_dir).await?;
        }
        let path = write_artifact(plist).await?;
        tracing::info!(label = %plist.label(), path = %path.display(), "wrote plist");
        Ok(())
    }

    async fn launchctl(&self, verb: &str, plist: &PropertyList) -> Result<String> {
        let path = plist.path();
        let path = path.display().to_string();
        self.runner
            .run_checked(LAUNCHCTL, &args([verb, "-w", path.as_str()]))
            .await
    }

    /// Parses `launchctl list` output for the row whose label matches.
    ///
    /// Rows are `PID<TAB>Status<TAB>Label`; a PID of `-` means not running.
    /// Returns a zero status when no row matches.
    pub fn parse_list(output: &str, label: &str) -> Result<ServiceStatus> {
        for line in output.trim().lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 || fields[2].trim() != label {
                continue;
            }

            let pid_field = fields[0].trim();
            let pid = if pid_field == "-" {
                0
            } else {
                pid_field.parse::<u32>().map_err(|e| {
                    ServiceError::status(format!("invalid pid {pid_field:?} for {label}: {e}"))
                })?
            };
            return Ok(ServiceStatus::new(pid != 0, pid));
        }

        Ok(ServiceStatus::default())
    }
}

#[async_trait]
impl PlatformAdapter for LaunchdAdapter {
    fn platform(&self) -> Platform {
        Platform::MacOS
    }

    async fn install(&self, start: bool) -> Result<()> {
        let plist = self.plist();
        self.write_plist(&plist).await?;

        if start {
            self.start().await?;
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let plist = self.plist();
        tracing::info!(label = %plist.label(), "loading plist with launchctl");

        let err = match self.launchctl("load", &plist).await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        match classify_launchctl(&err) {
            LaunchctlError::AlreadyLoaded => {
                tracing::info!(label = %plist.label(), "service already loaded");
                Ok(())
            }
            LaunchctlError::NotInstalled => {
                tracing::info!(label = %plist.label(), "service not installed yet, installing");
                self.write_plist(&plist).await?;
                match self.launchctl("load", &plist).await {
                    Ok(_) => Ok(()),
                    Err(e) if classify_launchctl(&e) == LaunchctlError::AlreadyLoaded => Ok(()),
                    Err(e) => Err(e),
                }
            }
            _ => Err(err),
        }
    }

    async fn stop(&self) -> Result<()> {
        let plist = self.plist();

        let Err(err) = self.launchctl("unload", &plist).await else {
            tracing::info!(label = %plist.label(), "unloaded plist");
            return Ok(());
        };

        match classify_launchctl(&err) {
            LaunchctlError::NotLoaded => {
                tracing::info!(label = %plist.label(), "no service matching plist running");
                Ok(())
            }
            LaunchctlError::NotInstalled => {
                tracing::info!(label = %plist.label(), "plist file doesn't exist, nothing to stop");
                Ok(())
            }
            _ => Err(err),
        }
    }

    async fn uninstall(&self) -> Result<()> {
        if let Err(err) = self.stop().await {
            // launchctl exits 3 when there is no matching process.
            if err.exit_status() != Some(3) {
                return Err(err);
            }
            tracing::debug!(error = %err, "ignoring stop failure during uninstall");
        }

        let plist = self.plist();
        tracing::info!(label = %plist.label(), "removing plist file");
        remove_artifact(&plist.path()).await
    }

    async fn status(&self) -> Result<ServiceStatus> {
        let output = self.runner.run(LAUNCHCTL, &args(["list"])).await?;
        // `launchctl list` may print warnings on stderr; only the exit code counts.
        if output.status != Some(0) {
            let message = output.message();
            return Err(ServiceError::command(LAUNCHCTL, output.status, message));
        }
        Self::parse_list(&output.stdout, &self.descriptor.label)
    }

    async fn exists(&self) -> bool {
        file_exists(&self.plist().path())
    }
}
