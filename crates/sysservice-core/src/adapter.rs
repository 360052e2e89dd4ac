//! Platform adapter abstraction for service lifecycle management.
//!
//! # Toyota Way: Standardized Work (標準作業)
//! Every platform adapter follows the same contract, so the facade behaves
//! predictably on launchd, systemd and the Windows Service Control Manager.
//!
//! # Idempotence
//! Reaching a state the service is already in succeeds: stopping a stopped
//! service, or uninstalling one that is not installed, returns `Ok(())`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ServiceStatus;

// =============================================================================
// Platform
// =============================================================================

/// Native service managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// macOS launchd.
    MacOS,
    /// Linux systemd.
    Linux,
    /// Windows Service Control Manager.
    Windows,
}

impl Platform {
    /// Platform the crate was compiled for.
    ///
    /// Unix targets other than macOS are treated as systemd hosts.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOS
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Returns the platform name as a static string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MacOS => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Name of the native manager.
    #[must_use]
    pub const fn manager(&self) -> &'static str {
        match self {
            Self::MacOS => "launchd",
            Self::Linux => "systemd",
            Self::Windows => "scm",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// PlatformAdapter
// =============================================================================

/// Lifecycle operations against one native service manager.
///
/// Each adapter is bound to a single descriptor at construction. Operations
/// are independent and stateless with respect to one another: native
/// artifacts are rebuilt on every call.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Returns the platform this adapter targets.
    fn platform(&self) -> Platform;

    /// Registers the service with the manager, optionally starting it.
    async fn install(&self, start: bool) -> Result<()>;

    /// Starts the service.
    async fn start(&self) -> Result<()>;

    /// Stops the service. Succeeds if it is already stopped.
    async fn stop(&self) -> Result<()>;

    /// Stops then starts the service.
    ///
    /// If stop fails, start is not attempted.
    async fn restart(&self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    /// Removes the service. Succeeds if it is not installed.
    async fn uninstall(&self) -> Result<()>;

    /// Queries the current state.
    async fn status(&self) -> Result<ServiceStatus>;

    /// Returns true if the service is registered with the manager.
    async fn exists(&self) -> bool;

    /// Runs the service's control loop.
    ///
    /// Only the Windows backend hosts one; the other managers supervise the
    /// program directly, so this returns immediately.
    async fn run(&self) -> Result<()> {
        Ok(())
    }
}
