//! Lifecycle facade.
//!
//! [`SystemService`] binds one descriptor to one platform adapter and exposes
//! the lifecycle operations. Every adapter call runs under the facade's
//! logging dispatch.

use std::sync::Arc;

use tracing::Dispatch;
use tracing::instrument::WithSubscriber;

use crate::adapter::{Platform, PlatformAdapter};
use crate::adapters::{NativeAdapter, native_adapter};
use crate::config::ServiceDescriptor;
use crate::env::EnvFacts;
use crate::error::Result;
use crate::types::ServiceStatus;

/// A program managed as a native OS service.
///
/// # Example
///
/// ```rust,ignore
/// use sysservice_core::{ServiceDescriptor, SystemService};
///
/// let desc = ServiceDescriptor::new("MyService", "com.myservice", "/usr/local/bin/agent")
///     .with_args(["run"]);
/// let service = SystemService::new(desc)?;
/// service.install(true).await?;
/// println!("{}", service.status().await?);
/// ```
pub struct SystemService<A: PlatformAdapter = NativeAdapter> {
    descriptor: Arc<ServiceDescriptor>,
    adapter: A,
    dispatch: Dispatch,
}

impl SystemService<NativeAdapter> {
    /// Creates a service for the current platform.
    ///
    /// # Errors
    /// Returns an error if the descriptor is invalid.
    pub fn new(descriptor: ServiceDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let descriptor = Arc::new(descriptor);
        let adapter = native_adapter(Arc::clone(&descriptor), EnvFacts::detect());
        Ok(Self {
            descriptor,
            adapter,
            dispatch: current_dispatch(),
        })
    }
}

impl<A: PlatformAdapter> SystemService<A> {
    /// Creates a service backed by a specific adapter.
    ///
    /// The adapter must have been built for the same descriptor.
    ///
    /// # Errors
    /// Returns an error if the descriptor is invalid.
    pub fn with_adapter(descriptor: Arc<ServiceDescriptor>, adapter: A) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            descriptor,
            adapter,
            dispatch: current_dispatch(),
        })
    }

    /// Routes this service's log output to `dispatch`.
    #[must_use]
    pub fn with_logger(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// The service descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// Platform of the underlying adapter.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.adapter.platform()
    }

    /// The underlying adapter.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Registers the service, optionally starting it.
    pub async fn install(&self, start: bool) -> Result<()> {
        self.adapter
            .install(start)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    /// Starts the service.
    pub async fn start(&self) -> Result<()> {
        self.adapter.start().with_subscriber(self.dispatch.clone()).await
    }

    /// Stops the service. Succeeds if already stopped.
    pub async fn stop(&self) -> Result<()> {
        self.adapter.stop().with_subscriber(self.dispatch.clone()).await
    }

    /// Restarts the service.
    pub async fn restart(&self) -> Result<()> {
        self.adapter.restart().with_subscriber(self.dispatch.clone()).await
    }

    /// Removes the service. Succeeds if not installed.
    pub async fn uninstall(&self) -> Result<()> {
        self.adapter
            .uninstall()
            .with_subscriber(self.dispatch.clone())
            .await
    }

    /// Queries the current state.
    pub async fn status(&self) -> Result<ServiceStatus> {
        self.adapter.status().with_subscriber(self.dispatch.clone()).await
    }

    /// Returns true if the service is registered.
    pub async fn exists(&self) -> bool {
        self.adapter.exists().with_subscriber(self.dispatch.clone()).await
    }

    /// Runs the service's control loop (Windows) or returns immediately.
    pub async fn run(&self) -> Result<()> {
        self.adapter.run().with_subscriber(self.dispatch.clone()).await
    }
}

/// The dispatch in effect where the facade is built (the global one unless a
/// scoped default is active).
fn current_dispatch() -> Dispatch {
    tracing::dispatcher::get_default(Dispatch::clone)
}

impl<A: PlatformAdapter> std::fmt::Debug for SystemService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemService")
            .field("descriptor", &self.descriptor)
            .field("platform", &self.adapter.platform())
            .finish_non_exhaustive()
    }
}
