//! Service control loop.
//!
//! The Windows Service Control Manager drives a hosted service through
//! control requests and expects state reports back. The loop itself is
//! platform-neutral: requests arrive through a [`ControlSource`], state
//! changes leave through a [`StatusReporter`] and notable events go to an
//! [`EventSink`].

use std::sync::mpsc;
use std::time::Duration;

use crate::error::Result;

/// Control request delivered by the service manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// Stop the service.
    Stop,
    /// The system is shutting down.
    Shutdown,
    /// Pause the service.
    Pause,
    /// Resume a paused service.
    Continue,
    /// Report the current state.
    Interrogate,
    /// Any request the loop does not handle.
    Unknown(String),
}

/// State reported to the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Starting up.
    StartPending,
    /// Running.
    Running,
    /// Paused.
    Paused,
    /// Shutting down.
    StopPending,
    /// Stopped.
    Stopped,
}

impl ServiceState {
    /// Returns the state name as a static string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartPending => "start_pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::StopPending => "stop_pending",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why the control loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// A stop request arrived.
    Stop,
    /// A shutdown request arrived.
    Shutdown,
    /// The request channel closed.
    SourceClosed,
}

// =============================================================================
// Seams
// =============================================================================

/// Blocking source of control requests.
pub trait ControlSource {
    /// Waits for the next request; `None` once the source is closed.
    fn next_request(&mut self) -> Option<ControlRequest>;
}

impl ControlSource for mpsc::Receiver<ControlRequest> {
    fn next_request(&mut self) -> Option<ControlRequest> {
        self.recv().ok()
    }
}

/// Receives state transitions.
pub trait StatusReporter {
    /// Reports `state` to the service manager.
    fn report(&mut self, state: ServiceState) -> Result<()>;
}

impl StatusReporter for Vec<ServiceState> {
    fn report(&mut self, state: ServiceState) -> Result<()> {
        self.push(state);
        Ok(())
    }
}

/// Destination for service events.
pub trait EventSink: Send + Sync {
    /// Informational event.
    fn info(&self, message: &str);
    /// Warning event.
    fn warning(&self, message: &str);
    /// Error event.
    fn error(&self, message: &str);
}

/// Event sink that forwards to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingEventSink {
    service: String,
}

impl TracingEventSink {
    /// Creates a sink tagging events with the service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl EventSink for TracingEventSink {
    fn info(&self, message: &str) {
        tracing::info!(service = %self.service, "{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(service = %self.service, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(service = %self.service, "{message}");
    }
}

// =============================================================================
// ControlLoop
// =============================================================================

/// Drives a service through its control requests.
pub struct ControlLoop<'a> {
    name: String,
    sink: &'a dyn EventSink,
    interrogate_gap: Duration,
}

impl<'a> ControlLoop<'a> {
    /// Creates a loop for the named service.
    #[must_use]
    pub fn new(name: impl Into<String>, sink: &'a dyn EventSink) -> Self {
        Self {
            name: name.into(),
            sink,
            interrogate_gap: Duration::from_millis(100),
        }
    }

    /// Overrides the delay between the two interrogate reports.
    #[must_use]
    pub const fn with_interrogate_gap(mut self, gap: Duration) -> Self {
        self.interrogate_gap = gap;
        self
    }

    /// Runs until a stop or shutdown request arrives or the source closes.
    ///
    /// Reports `StartPending` then `Running` on entry and `StopPending` on
    /// exit. An interrogation reports the current state twice.
    pub fn run(
        &self,
        source: &mut dyn ControlSource,
        reporter: &mut dyn StatusReporter,
    ) -> Result<StopCause> {
        reporter.report(ServiceState::StartPending)?;
        let mut current = ServiceState::Running;
        reporter.report(current)?;
        self.sink.info(&format!("{} service running", self.name));

        let cause = loop {
            let Some(request) = source.next_request() else {
                self.sink
                    .warning(&format!("{} control channel closed", self.name));
                break StopCause::SourceClosed;
            };

            match request {
                ControlRequest::Interrogate => {
                    reporter.report(current)?;
                    std::thread::sleep(self.interrogate_gap);
                    reporter.report(current)?;
                }
                ControlRequest::Stop => {
                    self.sink.info(&format!("{} received stop request", self.name));
                    break StopCause::Stop;
                }
                ControlRequest::Shutdown => {
                    self.sink
                        .info(&format!("{} received shutdown request", self.name));
                    break StopCause::Shutdown;
                }
                ControlRequest::Pause => {
                    current = ServiceState::Paused;
                    reporter.report(current)?;
                }
                ControlRequest::Continue => {
                    current = ServiceState::Running;
                    reporter.report(current)?;
                }
                ControlRequest::Unknown(what) => {
                    self.sink
                        .error(&format!("unexpected control request {what}"));
                }
            }
        };

        reporter.report(ServiceState::StopPending)?;
        Ok(cause)
    }
}
