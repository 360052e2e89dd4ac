//! Service Control Manager helpers that do not need the Win32 API.
//!
//! Error-code classification, `sc.exe queryex` parsing, state polling and
//! blocking-call plumbing are kept here so they build and test on every
//! platform.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use tracing::Dispatch;

use crate::error::{Result, ServiceError};
use crate::types::ServiceStatus;

/// `ERROR_SERVICE_ALREADY_RUNNING`
pub const ERROR_SERVICE_ALREADY_RUNNING: i32 = 1056;
/// `ERROR_SERVICE_DOES_NOT_EXIST`
pub const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;
/// `ERROR_SERVICE_NOT_ACTIVE`
pub const ERROR_SERVICE_NOT_ACTIVE: i32 = 1062;
/// `ERROR_SERVICE_EXISTS`
pub const ERROR_SERVICE_EXISTS: i32 = 1073;

/// Outcome classes of a failed SCM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScmError {
    /// The service is already running.
    AlreadyRunning,
    /// The service is not registered.
    DoesNotExist,
    /// The service has not been started.
    NotActive,
    /// A service with the same name is already registered.
    Exists,
    /// Anything else.
    Other,
}

/// Classifies a Win32 error code.
#[must_use]
pub const fn classify_scm_code(code: i32) -> ScmError {
    match code {
        ERROR_SERVICE_ALREADY_RUNNING => ScmError::AlreadyRunning,
        ERROR_SERVICE_DOES_NOT_EXIST => ScmError::DoesNotExist,
        ERROR_SERVICE_NOT_ACTIVE => ScmError::NotActive,
        ERROR_SERVICE_EXISTS => ScmError::Exists,
        _ => ScmError::Other,
    }
}

/// Classifies a failed `sc.exe` invocation.
///
/// `sc.exe` exits with the Win32 code and prints `FAILED <code>:` on stdout,
/// so either source is accepted.
#[must_use]
pub fn classify_sc_failure(status: Option<i32>, stdout: &str) -> ScmError {
    if let Some(code) = status {
        let class = classify_scm_code(code);
        if class != ScmError::Other {
            return class;
        }
    }

    stdout
        .split("FAILED")
        .nth(1)
        .and_then(|rest| {
            rest.trim_start()
                .split(|c: char| !c.is_ascii_digit())
                .next()
        })
        .and_then(|digits| digits.parse::<i32>().ok())
        .map_or(ScmError::Other, classify_scm_code)
}

/// Maps "service not registered" to `Ok(None)`.
///
/// Stop and Uninstall use this so that acting on a service that was never
/// installed is a no-op, as it is for launchd and systemd.
pub fn tolerate_unregistered<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Runs blocking SCM work on the blocking pool.
///
/// The caller's current dispatch is carried onto the worker thread so log
/// output keeps going to the facade's logger.
pub async fn run_blocking<T, F>(what: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
    tokio::task::spawn_blocking(move || tracing::dispatcher::with_default(&dispatch, f))
        .await
        .map_err(|e| ServiceError::Internal(format!("{what} failed: {e}")))?
}

/// Parses `sc.exe queryex` output.
///
/// The `PID` line's value is parsed leniently; unparseable values leave the
/// pid at zero. Running means a `STATE` line mentioning `RUNNING`.
#[must_use]
pub fn parse_queryex(output: &str) -> ServiceStatus {
    let mut status = ServiceStatus::default();

    for line in output.split(['\r', '\n']) {
        if line.contains("PID") {
            if let Some(value) = line.split(':').nth(1) {
                if let Ok(pid) = value.trim().parse::<u32>() {
                    status.pid = pid;
                }
            }
        }

        if line.contains("STATE") && line.contains("RUNNING") {
            status.running = true;
        }
    }

    status
}

/// Bounded wait for a service to reach a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePoller {
    timeout: Duration,
    interval: Duration,
}

impl Default for StatePoller {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_millis(300))
    }
}

impl StatePoller {
    /// Creates a poller.
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Maximum time to wait.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between queries.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until `query` reports `target`, starting from `initial`.
    ///
    /// Query errors abort the wait. Exceeding the deadline yields
    /// [`ServiceError::Timeout`].
    pub fn wait<S, F>(&self, target: &S, initial: S, mut query: F) -> Result<()>
    where
        S: PartialEq + Debug,
        F: FnMut() -> Result<S>,
    {
        let started = Instant::now();
        let mut current = initial;

        while current != *target {
            if started.elapsed() >= self.timeout {
                return Err(ServiceError::Timeout {
                    state: format!("{target:?}"),
                    after: started.elapsed(),
                });
            }

            std::thread::sleep(self.interval);
            current = query()?;
            tracing::trace!(state = ?current, target = ?target, "polled service state");
        }

        Ok(())
    }
}
