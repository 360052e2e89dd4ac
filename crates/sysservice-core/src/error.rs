//! Error types for sysservice-core.
//!
//! Per Iron Lotus Framework: All errors are explicit, no panics allowed.
//! Native-tool failures keep their exit status and diagnostic text so each
//! adapter can classify them in a single place.

use std::time::Duration;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Comprehensive error type for service lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The native service manager has no record of the service.
    ///
    /// Distinguished from [`ServiceError::Command`] so callers can special-case
    /// "nothing to stop or uninstall" without matching on text.
    #[error("the service \"{name}\" does not exist")]
    DoesNotExist {
        /// Service name as registered with the manager.
        name: String,
    },

    /// A service with the same name is already registered.
    #[error("service {name} already exists")]
    AlreadyExists {
        /// Service name as registered with the manager.
        name: String,
    },

    /// A native tool ran and reported failure.
    #[error("{program} failed: {message}")]
    Command {
        /// Program that was invoked (e.g. `launchctl`).
        program: String,
        /// Exit status, if the process exited normally.
        status: Option<i32>,
        /// Diagnostic text (stderr, or `exit status N` when stderr was empty).
        message: String,
    },

    /// A native tool could not be executed at all.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Native status output could not be interpreted.
    #[error("status query failed: {0}")]
    Status(String),

    /// Waiting for a state transition exceeded its deadline.
    #[error("timeout waiting for service to reach state {state} after {after:?}")]
    Timeout {
        /// State that was awaited.
        state: String,
        /// Elapsed wall-clock time.
        after: Duration,
    },

    /// Service manager API failure, wrapped with context.
    #[error("{context}: {message}")]
    Manager {
        /// What was being attempted.
        context: String,
        /// Error reported by the manager.
        message: String,
    },

    /// Descriptor validation or loading failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Native configuration artifact could not be rendered.
    #[error("template error: {0}")]
    Template(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in production).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Creates a "does not exist" error.
    #[must_use]
    pub fn does_not_exist(name: impl Into<String>) -> Self {
        Self::DoesNotExist { name: name.into() }
    }

    /// Creates an "already exists" error.
    #[must_use]
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Creates a native command failure.
    #[must_use]
    pub fn command(program: impl Into<String>, status: Option<i32>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a service manager error with context.
    #[must_use]
    pub fn manager(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Manager {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(msg: impl Into<String>) -> Self {
        Self::Status(msg.into())
    }

    /// Returns true if the manager reported that the service is unknown.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DoesNotExist { .. })
    }

    /// Returns true if this error is a state-transition timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Exit status of a failed native command, if any.
    #[must_use]
    pub const fn exit_status(&self) -> Option<i32> {
        match self {
            Self::Command { status, .. } => *status,
            _ => None,
        }
    }

    /// Diagnostic text of a failed native command, lowercased for matching.
    #[must_use]
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Command { message, .. } => Some(message.to_lowercase()),
            _ => None,
        }
    }
}
