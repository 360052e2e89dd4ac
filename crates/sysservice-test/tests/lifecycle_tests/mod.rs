//! Lifecycle Falsification Tests for sysservice
//!
//! A passing test means the claim survived the falsification attempt.

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod control;
mod facade;
mod launchd;
mod systemd;
mod templates;
