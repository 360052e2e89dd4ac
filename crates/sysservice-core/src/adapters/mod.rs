//! Platform-specific adapter implementations.
//!
//! - [`LaunchdAdapter`]: macOS launchd
//! - [`SystemdAdapter`]: Linux systemd
//! - `WindowsAdapter`: Windows Service Control Manager (Windows only)
//!
//! [`NativeAdapter`] names the adapter for the compilation target.

mod launchd;
pub mod scm;
mod systemd;
#[cfg(windows)]
mod windows;

pub use launchd::{LaunchctlError, LaunchdAdapter, classify_launchctl};
pub use systemd::{SystemctlError, SystemdAdapter, classify_systemctl};
#[cfg(windows)]
pub use windows::{EventLog, WindowsAdapter};

use std::sync::Arc;

use crate::config::ServiceDescriptor;
use crate::env::EnvFacts;

/// Adapter for the compilation target.
#[cfg(target_os = "macos")]
pub type NativeAdapter = LaunchdAdapter;

/// Adapter for the compilation target.
#[cfg(windows)]
pub type NativeAdapter = WindowsAdapter;

/// Adapter for the compilation target.
#[cfg(not(any(target_os = "macos", windows)))]
pub type NativeAdapter = SystemdAdapter;

/// Builds the native adapter with the real command runner.
#[cfg(target_os = "macos")]
#[must_use]
pub fn native_adapter(descriptor: Arc<ServiceDescriptor>, env: EnvFacts) -> NativeAdapter {
    LaunchdAdapter::new(descriptor, env)
}

/// Builds the native adapter with the real command runner.
#[cfg(windows)]
#[must_use]
pub fn native_adapter(descriptor: Arc<ServiceDescriptor>, _env: EnvFacts) -> NativeAdapter {
    WindowsAdapter::new(descriptor)
}

/// Builds the native adapter with the real command runner.
#[cfg(not(any(target_os = "macos", windows)))]
#[must_use]
pub fn native_adapter(descriptor: Arc<ServiceDescriptor>, env: EnvFacts) -> NativeAdapter {
    SystemdAdapter::new(descriptor, env)
}
