//! Windows Service Control Manager adapter implementation.
//!
//! Registration, start, stop and removal go through the SCM API; status and
//! existence are read from `sc.exe queryex`. The service is identified by the
//! descriptor's `name`.

mod dispatch;
mod eventlog;

use std::ffi::OsString;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument::WithSubscriber;
use windows_service::service::{
    Service, ServiceAccess, ServiceErrorControl, ServiceInfo, ServiceStartType,
    ServiceState as ScmState, ServiceType,
};
use windows_service::service_manager::{ServiceManager, ServiceManagerAccess};

use super::scm::{
    ScmError, StatePoller, classify_sc_failure, classify_scm_code, parse_queryex, run_blocking,
    tolerate_unregistered,
};
use crate::adapter::{Platform, PlatformAdapter};
use crate::config::ServiceDescriptor;
use crate::control::{ControlLoop, ControlRequest, EventSink, TracingEventSink};
use crate::error::{Result, ServiceError};
use crate::runner::{CommandRunner, SystemRunner};
use crate::types::ServiceStatus;

pub use eventlog::EventLog;

const SC: &str = "sc.exe";

/// Windows Service Control Manager adapter.
pub struct WindowsAdapter {
    descriptor: Arc<ServiceDescriptor>,
    runner: Arc<dyn CommandRunner>,
    poller: StatePoller,
}

impl WindowsAdapter {
    /// Creates an adapter for the descriptor.
    #[must_use]
    pub fn new(descriptor: Arc<ServiceDescriptor>) -> Self {
        Self::with_runner(descriptor, Arc::new(SystemRunner))
    }

    /// Creates an adapter with a custom runner for `sc.exe` queries.
    #[must_use]
    pub fn with_runner(descriptor: Arc<ServiceDescriptor>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            descriptor,
            runner,
            poller: StatePoller::default(),
        }
    }

    /// Runs blocking SCM work off the async executor.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ServiceDescriptor) -> Result<T> + Send + 'static,
    {
        let descriptor = Arc::clone(&self.descriptor);
        run_blocking("SCM task", move || f(&descriptor)).await
    }

    async fn queryex(&self) -> Result<std::result::Result<String, ScmError>> {
        let args = vec!["queryex".to_string(), self.descriptor.name.clone()];
        let output = self.runner.run(SC, &args).await?;
        if output.status == Some(0) {
            Ok(Ok(output.stdout))
        } else {
            Ok(Err(classify_sc_failure(output.status, &output.stdout)))
        }
    }
}

fn win32_code(err: &windows_service::Error) -> Option<i32> {
    match err {
        windows_service::Error::Winapi(io) => io.raw_os_error(),
        _ => None,
    }
}

fn classify(err: &windows_service::Error) -> ScmError {
    win32_code(err).map_or(ScmError::Other, classify_scm_code)
}

/// Wraps an SCM failure with context, keeping the OS error code and text
/// that `windows_service::Error`'s own message leaves out.
pub(crate) fn scm_error(context: &str, err: &windows_service::Error) -> ServiceError {
    match err {
        windows_service::Error::Winapi(io) => ServiceError::manager(context, io),
        other => ServiceError::manager(context, other),
    }
}

fn connect(access: ServiceManagerAccess) -> Result<ServiceManager> {
    ServiceManager::local_computer(None::<&str>, access)
        .map_err(|e| scm_error("error connecting to service manager", &e))
}

/// Opens the named service, mapping "not registered" to
/// [`ServiceError::DoesNotExist`].
fn open(name: &str, access: ServiceAccess) -> Result<Service> {
    let manager = connect(ServiceManagerAccess::CONNECT)?;
    manager.open_service(name, access).map_err(|e| {
        if classify(&e) == ScmError::DoesNotExist {
            ServiceError::does_not_exist(name)
        } else {
            scm_error("could not access service", &e)
        }
    })
}

fn install_blocking(descriptor: &ServiceDescriptor) -> Result<()> {
    let name = descriptor.name.as_str();
    tracing::info!(service = %name, "installing system service");

    let manager = connect(ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE)?;
    if manager.open_service(name, ServiceAccess::QUERY_STATUS).is_ok() {
        return Err(ServiceError::already_exists(name));
    }

    let display_name = if descriptor.description.is_empty() {
        name
    } else {
        descriptor.description.as_str()
    };
    let info = ServiceInfo {
        name: OsString::from(name),
        display_name: OsString::from(display_name),
        service_type: ServiceType::OWN_PROCESS,
        start_type: ServiceStartType::AutoStart,
        error_control: ServiceErrorControl::Normal,
        executable_path: descriptor.program.clone(),
        launch_arguments: descriptor.args.iter().map(OsString::from).collect(),
        dependencies: Vec::new(),
        account_name: None,
        account_password: None,
    };
    tracing::info!(
        service = %name,
        program = %descriptor.program.display(),
        args = ?descriptor.args,
        "creating service"
    );

    let service = manager
        .create_service(&info, ServiceAccess::CHANGE_CONFIG | ServiceAccess::DELETE)
        .map_err(|e| match classify(&e) {
            ScmError::Exists => ServiceError::already_exists(name),
            _ => scm_error("error creating service", &e),
        })?;

    if !descriptor.description.is_empty() {
        if let Err(e) = service.set_description(&descriptor.description) {
            tracing::warn!(service = %name, error = %e, "could not set service description");
        }
    }

    eventlog::remove_source(name)?;
    tracing::info!(service = %name, "setting up event logs");
    if let Err(e) = eventlog::install_source(name) {
        if let Err(delete_err) = service.delete() {
            tracing::error!(service = %name, error = %delete_err, "could not roll back service registration");
        }
        return Err(e);
    }

    Ok(())
}

fn start_blocking(descriptor: &ServiceDescriptor) -> Result<()> {
    let name = descriptor.name.as_str();
    tracing::info!(service = %name, "starting system service");

    let service = open(name, ServiceAccess::START)?;
    match service.start(&descriptor.args) {
        Ok(()) => Ok(()),
        Err(e) if classify(&e) == ScmError::AlreadyRunning => {
            tracing::info!(service = %name, "service already running");
            Ok(())
        }
        Err(e) => Err(scm_error("could not start service", &e)),
    }
}

fn stop_blocking(descriptor: &ServiceDescriptor, poller: StatePoller) -> Result<()> {
    let name = descriptor.name.as_str();
    tracing::info!(service = %name, "stopping system service");

    let Some(service) =
        tolerate_unregistered(open(name, ServiceAccess::STOP | ServiceAccess::QUERY_STATUS))?
    else {
        tracing::info!(service = %name, "service not installed, nothing to stop");
        return Ok(());
    };

    let status = match service.stop() {
        Ok(status) => status,
        Err(e) if classify(&e) == ScmError::NotActive => {
            tracing::info!(service = %name, "service already stopped");
            return Ok(());
        }
        Err(e) => return Err(scm_error("could not send stop control", &e)),
    };

    poller.wait(&ScmState::Stopped, status.current_state, || {
        service
            .query_status()
            .map(|s| s.current_state)
            .map_err(|e| scm_error("could not retrieve service status", &e))
    })
}

fn uninstall_blocking(descriptor: &ServiceDescriptor) -> Result<()> {
    let name = descriptor.name.as_str();
    tracing::info!(service = %name, "uninstalling system service");

    match tolerate_unregistered(open(name, ServiceAccess::DELETE))? {
        Some(service) => service
            .delete()
            .map_err(|e| scm_error("could not delete service", &e))?,
        None => tracing::info!(service = %name, "service not installed, nothing to remove"),
    }

    eventlog::remove_source(name)
}

#[async_trait]
impl PlatformAdapter for WindowsAdapter {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    async fn install(&self, start: bool) -> Result<()> {
        self.blocking(install_blocking).await?;
        if start {
            self.start().await?;
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.blocking(start_blocking).await
    }

    async fn stop(&self) -> Result<()> {
        let poller = self.poller;
        self.blocking(move |d| stop_blocking(d, poller)).await
    }

    async fn uninstall(&self) -> Result<()> {
        self.blocking(uninstall_blocking).await
    }

    async fn status(&self) -> Result<ServiceStatus> {
        tracing::debug!(service = %self.descriptor.name, "getting service status");
        match self.queryex().await? {
            Ok(stdout) => Ok(parse_queryex(&stdout)),
            Err(ScmError::DoesNotExist) => Ok(ServiceStatus::default()),
            Err(class) => Err(ServiceError::status(format!(
                "sc queryex {} failed: {class:?}",
                self.descriptor.name
            ))),
        }
    }

    async fn exists(&self) -> bool {
        matches!(self.queryex().await, Ok(Ok(_)))
    }

    async fn run(&self) -> Result<()> {
        let name = self.descriptor.name.clone();
        let debug_mode = self.descriptor.debug;
        tracing::info!(service = %name, debug = debug_mode, "running service");

        let sink: Arc<dyn EventSink> = if debug_mode {
            Arc::new(TracingEventSink::new(name.clone()))
        } else {
            Arc::new(EventLog::open(&name)?)
        };
        sink.info(&format!("starting {name} service"));

        let result = if debug_mode {
            run_interactive(name.clone(), Arc::clone(&sink)).await
        } else {
            let host_sink = Arc::clone(&sink);
            let host_name = name.clone();
            run_blocking("service dispatcher", move || {
                dispatch::run_dispatcher(&host_name, host_sink)
            })
            .await
        };

        match result {
            Ok(cause) => {
                sink.info(&format!("{name} service stopped"));
                tracing::info!(service = %name, cause = ?cause, "service stopped");
                Ok(())
            }
            Err(e) => {
                sink.error(&format!("{name} service failed: {e}"));
                Err(e)
            }
        }
    }
}

/// Runs the control loop in the console; Ctrl-C requests a stop.
async fn run_interactive(
    name: String,
    sink: Arc<dyn EventSink>,
) -> Result<crate::control::StopCause> {
    let (tx, mut rx) = std::sync::mpsc::channel();

    let ctrl_c = tokio::spawn(
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl-C, stopping");
                let _ = tx.send(ControlRequest::Stop);
            }
        }
        .with_current_subscriber(),
    );

    let result = run_blocking("control loop", move || {
        ControlLoop::new(name, sink.as_ref()).run(&mut rx, &mut dispatch::ConsoleReporter)
    })
    .await;

    ctrl_c.abort();
    result
}
