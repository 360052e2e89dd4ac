//! Core value types shared by every backend.

use serde::{Deserialize, Serialize};

/// Portable snapshot of a service's runtime state.
///
/// Produced fresh by every status query; never cached. A `pid` of zero means
/// no process could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Whether the manager reports the service as running.
    pub running: bool,
    /// Main process ID, or 0 when unknown.
    pub pid: u32,
}

impl ServiceStatus {
    /// Creates a status value.
    #[must_use]
    pub const fn new(running: bool, pid: u32) -> Self {
        Self { running, pid }
    }

    /// Status for a service that is not running.
    #[must_use]
    pub const fn stopped() -> Self {
        Self {
            running: false,
            pid: 0,
        }
    }

    /// Returns the PID if one was resolved.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        if self.pid == 0 { None } else { Some(self.pid) }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "running: {}, pid: {}", self.running, self.pid)
    }
}
