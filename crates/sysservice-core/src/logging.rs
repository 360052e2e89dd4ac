//! Logging setup.
//!
//! The library never installs a global subscriber on its own. A facade
//! carries a [`tracing::Dispatch`]; these helpers build the default
//! line-oriented one for binaries and demos.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Builds a stdout dispatch filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"`).
#[must_use]
pub fn stdout_dispatch(default_directive: &str) -> Dispatch {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    Dispatch::new(subscriber)
}

/// Installs [`stdout_dispatch`] as the global default.
///
/// Returns false if a global subscriber was already set.
pub fn init(default_directive: &str) -> bool {
    tracing::dispatcher::set_global_default(stdout_dispatch(default_directive)).is_ok()
}

/// A dispatch that discards everything.
#[must_use]
pub fn silent() -> Dispatch {
    Dispatch::none()
}
