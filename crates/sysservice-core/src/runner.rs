//! Execution of native service-manager tools.
//!
//! Every adapter shells out through a [`CommandRunner`] so tests can swap the
//! real process launcher for a scripted one.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Result, ServiceError};

/// Captured result of one native tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a successful invocation.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a failed invocation.
    #[must_use]
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// True when the tool exited zero and wrote nothing to stderr.
    ///
    /// Service-manager tools frequently exit zero while reporting problems on
    /// stderr, so any diagnostic output counts as failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == Some(0) && self.stderr.trim().is_empty()
    }

    /// Diagnostic text: stderr if present, otherwise `exit status N`.
    #[must_use]
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }

    /// Converts to `Ok(stdout)` or a [`ServiceError::Command`].
    pub fn into_result(self, program: &str) -> Result<String> {
        if self.succeeded() {
            Ok(self.stdout)
        } else {
            let message = self.message();
            Err(ServiceError::command(program, self.status, message))
        }
    }
}

/// Runs an external program and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` to completion.
    ///
    /// Only failure to launch the program is an error here; a nonzero exit is
    /// reported through [`CommandOutput`].
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Runs the program and converts a failed invocation into an error.
    async fn run_checked(&self, program: &str, args: &[String]) -> Result<String> {
        self.run(program, args).await?.into_result(program)
    }
}

/// Launches real processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(program, args = ?args, "executing");

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| ServiceError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.succeeded() {
            tracing::debug!(program, status = ?result.status, stderr = %result.stderr.trim(), "command failed");
        }

        Ok(result)
    }
}

/// Builds an owned argument vector.
pub(crate) fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
