// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # sysservice-test
//!
//! Testing infrastructure for sysservice.
//!
//! This crate provides:
//! - **Scripted runner**: canned answers for `launchctl`, `systemctl` and `sc.exe`
//! - **Sandbox harness**: adapters rooted in a temporary home directory
//! - **Log capture**: in-memory `tracing` output for assertions
//!
//! ## Iron Lotus Framework
//!
//! - **Built-in Quality** (品質の作り込み): Quality cannot be inspected in
//! - **Popperian Falsification**: Tests designed to refute claims
//!
//! ## Example
//!
//! ```rust,ignore
//! use sysservice_core::{CommandOutput, PlatformAdapter};
//! use sysservice_test::{SandboxHarness, ScriptedRunner};
//!
//! let harness = SandboxHarness::new()?.with_runner(
//!     ScriptedRunner::new().on("launchctl list", CommandOutput::success("42\t0\tcom.myservice\n")),
//! );
//! let status = harness.launchd().status().await?;
//! assert_eq!(status.pid, 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod harness;
pub mod runner;

pub use error::{Result, TestError};
pub use harness::{LogCapture, SandboxHarness};
pub use runner::ScriptedRunner;
