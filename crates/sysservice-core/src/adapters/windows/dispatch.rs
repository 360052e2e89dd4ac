//! Hosting the control loop under the Service Control Manager.

use std::ffi::OsString;
use std::sync::{Arc, OnceLock, mpsc};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::Dispatch;
use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState as ScmState,
    ServiceStatus as ScmStatus, ServiceType,
};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};
use windows_service::{define_windows_service, service_dispatcher};

use crate::control::{
    ControlLoop, ControlRequest, EventSink, ServiceState, StatusReporter, StopCause,
};
use super::scm_error;
use crate::error::{Result, ServiceError};

struct HostContext {
    name: String,
    dispatch: Dispatch,
    sink: Arc<dyn EventSink>,
    outcome: Mutex<Option<Result<StopCause>>>,
}

static CONTEXT: OnceLock<HostContext> = OnceLock::new();

define_windows_service!(ffi_service_main, service_main);

/// Runs the control loop under the SCM dispatcher. Blocks until the service
/// stops.
pub fn run_dispatcher(name: &str, sink: Arc<dyn EventSink>) -> Result<StopCause> {
    CONTEXT
        .set(HostContext {
            name: name.to_string(),
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
            sink,
            outcome: Mutex::new(None),
        })
        .map_err(|_| ServiceError::Internal("service dispatcher already started".into()))?;

    service_dispatcher::start(name, ffi_service_main)
        .map_err(|e| scm_error("error running service", &e))?;

    CONTEXT
        .get()
        .and_then(|ctx| ctx.outcome.lock().take())
        .unwrap_or(Ok(StopCause::SourceClosed))
}

fn service_main(_arguments: Vec<OsString>) {
    let Some(ctx) = CONTEXT.get() else {
        return;
    };
    // The SCM calls this on its own thread; keep logging on the caller's dispatch.
    let outcome = tracing::dispatcher::with_default(&ctx.dispatch, || host(ctx));
    if let Err(e) = &outcome {
        ctx.sink.error(&format!("{} service failed: {e}", ctx.name));
    }
    *ctx.outcome.lock() = Some(outcome);
}

fn host(ctx: &HostContext) -> Result<StopCause> {
    let (tx, mut rx) = mpsc::channel();

    let handler = move |control| -> ServiceControlHandlerResult {
        let (request, result) = translate(control);
        let _ = tx.send(request);
        result
    };
    let status_handle = service_control_handler::register(&ctx.name, handler)
        .map_err(|e| scm_error("error registering control handler", &e))?;

    let mut reporter = ScmReporter { handle: status_handle };
    let cause = ControlLoop::new(ctx.name.clone(), ctx.sink.as_ref()).run(&mut rx, &mut reporter)?;
    reporter.report(ServiceState::Stopped)?;
    Ok(cause)
}

fn translate(control: ServiceControl) -> (ControlRequest, ServiceControlHandlerResult) {
    match control {
        ServiceControl::Stop => (ControlRequest::Stop, ServiceControlHandlerResult::NoError),
        ServiceControl::Shutdown => (
            ControlRequest::Shutdown,
            ServiceControlHandlerResult::NoError,
        ),
        ServiceControl::Pause => (ControlRequest::Pause, ServiceControlHandlerResult::NoError),
        ServiceControl::Continue => (
            ControlRequest::Continue,
            ServiceControlHandlerResult::NoError,
        ),
        ServiceControl::Interrogate => (
            ControlRequest::Interrogate,
            ServiceControlHandlerResult::NoError,
        ),
        other => (
            ControlRequest::Unknown(format!("{other:?}")),
            ServiceControlHandlerResult::NotImplemented,
        ),
    }
}

struct ScmReporter {
    handle: ServiceStatusHandle,
}

impl StatusReporter for ScmReporter {
    fn report(&mut self, state: ServiceState) -> Result<()> {
        let (current_state, controls_accepted) = match state {
            ServiceState::StartPending => (ScmState::StartPending, ServiceControlAccept::empty()),
            ServiceState::Running => (ScmState::Running, accepted()),
            ServiceState::Paused => (ScmState::Paused, accepted()),
            ServiceState::StopPending => (ScmState::StopPending, ServiceControlAccept::empty()),
            ServiceState::Stopped => (ScmState::Stopped, ServiceControlAccept::empty()),
        };

        self.handle
            .set_service_status(ScmStatus {
                service_type: ServiceType::OWN_PROCESS,
                current_state,
                controls_accepted,
                exit_code: ServiceExitCode::Win32(0),
                checkpoint: 0,
                wait_hint: Duration::default(),
                process_id: None,
            })
            .map_err(|e| scm_error("error reporting service status", &e))
    }
}

fn accepted() -> ServiceControlAccept {
    ServiceControlAccept::STOP | ServiceControlAccept::SHUTDOWN | ServiceControlAccept::PAUSE_CONTINUE
}

/// Reporter used when running interactively.
pub struct ConsoleReporter;

impl StatusReporter for ConsoleReporter {
    fn report(&mut self, state: ServiceState) -> Result<()> {
        tracing::debug!(state = %state, "service state");
        Ok(())
    }
}
