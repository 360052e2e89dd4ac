// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # sysservice-core
//!
//! Install and control a long-running program as a native OS service.
//!
//! This crate provides:
//!
//! - [`ServiceDescriptor`] describing the program to run
//! - [`PlatformAdapter`] implemented for launchd, systemd and the Windows
//!   Service Control Manager
//! - [`SystemService`], the lifecycle facade (install, start, stop, restart,
//!   uninstall, status, exists, run)
//! - [`ControlLoop`] hosting a Windows service's control requests
//!
//! ## Iron Lotus Framework
//!
//! - **Jidoka**: Explicit error handling, no panics
//! - **Poka-Yoke**: Descriptors are validated before any native call
//! - **Standardized Work**: One contract across every service manager
//!
//! ## Example
//!
//! ```rust,ignore
//! use sysservice_core::{ServiceDescriptor, SystemService};
//!
//! let service = SystemService::new(
//!     ServiceDescriptor::new("MyService", "com.myservice", "/usr/local/bin/agent")
//!         .with_args(["run"]),
//! )?;
//! if !service.exists().await {
//!     service.install(true).await?;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod control;
pub mod env;
pub mod error;
pub mod logging;
pub mod runner;
pub mod service;
pub mod template;
pub mod types;

pub use adapter::{Platform, PlatformAdapter};
pub use adapters::{LaunchdAdapter, NativeAdapter, SystemdAdapter};
#[cfg(windows)]
pub use adapters::WindowsAdapter;
pub use config::ServiceDescriptor;
pub use control::{
    ControlLoop, ControlRequest, ControlSource, EventSink, ServiceState, StatusReporter,
    StopCause, TracingEventSink,
};
pub use env::EnvFacts;
pub use error::{Result, ServiceError};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use service::SystemService;
pub use template::{Artifact, PropertyList, UnitFile};
pub use types::ServiceStatus;
