//! Sandboxed service harness.
//!
//! # Toyota Way: Built-in Quality (品質の作り込み)
//! Quality cannot be inspected in; it must be built in.
//!
//! The harness roots a non-elevated user in a temporary home directory, so
//! plist and unit files land in the sandbox, and wires adapters to a
//! [`ScriptedRunner`] instead of the real service-manager tools.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sysservice_core::{
    Artifact, EnvFacts, LaunchdAdapter, PropertyList, ServiceDescriptor, SystemService,
    SystemdAdapter, UnitFile,
};
use tempfile::TempDir;
use tracing::Dispatch;

use crate::error::{Result, TestError};
use crate::runner::ScriptedRunner;

/// Sandboxed environment for exercising adapters.
pub struct SandboxHarness {
    home: TempDir,
    descriptor: Arc<ServiceDescriptor>,
    runner: Arc<ScriptedRunner>,
}

impl SandboxHarness {
    /// Creates a sandbox with the default descriptor and an empty script.
    ///
    /// # Errors
    /// Returns an error if the temporary home cannot be created.
    pub fn new() -> Result<Self> {
        let home = tempfile::Builder::new()
            .prefix("sysservice-home-")
            .tempdir()
            .map_err(|e| TestError::harness(format!("failed to create sandbox home: {e}")))?;
        Ok(Self {
            home,
            descriptor: Arc::new(Self::default_descriptor()),
            runner: Arc::new(ScriptedRunner::new()),
        })
    }

    /// Descriptor used unless overridden.
    #[must_use]
    pub fn default_descriptor() -> ServiceDescriptor {
        ServiceDescriptor::new("MyService", "com.myservice", "/usr/local/bin/myservice")
            .with_args(["run"])
            .with_description("My systemservice test!")
            .with_documentation("https://github.com/danawoodman/systemservice")
    }

    /// Replaces the descriptor.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: ServiceDescriptor) -> Self {
        self.descriptor = Arc::new(descriptor);
        self
    }

    /// Replaces the command script.
    #[must_use]
    pub fn with_runner(mut self, runner: ScriptedRunner) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Sandbox home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// Environment facts for the sandboxed user.
    #[must_use]
    pub fn env(&self) -> EnvFacts {
        EnvFacts::new("tester", self.home.path(), false)
    }

    /// The descriptor.
    #[must_use]
    pub fn descriptor(&self) -> Arc<ServiceDescriptor> {
        Arc::clone(&self.descriptor)
    }

    /// The scripted runner shared by every adapter built here.
    #[must_use]
    pub fn runner(&self) -> &ScriptedRunner {
        &self.runner
    }

    /// launchd adapter rooted in the sandbox.
    #[must_use]
    pub fn launchd(&self) -> LaunchdAdapter {
        LaunchdAdapter::with_runner(self.descriptor(), self.env(), self.runner.clone())
    }

    /// systemd adapter rooted in the sandbox.
    #[must_use]
    pub fn systemd(&self) -> SystemdAdapter {
        SystemdAdapter::with_runner(self.descriptor(), self.env(), self.runner.clone())
    }

    /// Facade over the sandboxed launchd adapter.
    ///
    /// # Errors
    /// Returns an error if the descriptor is invalid.
    pub fn launchd_service(&self) -> Result<SystemService<LaunchdAdapter>> {
        Ok(SystemService::with_adapter(self.descriptor(), self.launchd())?)
    }

    /// Facade over the sandboxed systemd adapter.
    ///
    /// # Errors
    /// Returns an error if the descriptor is invalid.
    pub fn systemd_service(&self) -> Result<SystemService<SystemdAdapter>> {
        Ok(SystemService::with_adapter(self.descriptor(), self.systemd())?)
    }

    /// Path of the plist inside the sandbox.
    #[must_use]
    pub fn plist_path(&self) -> PathBuf {
        PropertyList::new(&self.descriptor, &self.env()).path()
    }

    /// Path of the unit file inside the sandbox.
    #[must_use]
    pub fn unit_path(&self) -> PathBuf {
        UnitFile::new(&self.descriptor, &self.env()).path()
    }
}

// =============================================================================
// LogCapture
// =============================================================================

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatch writing every event at `TRACE` and above into this capture.
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        Dispatch::new(subscriber)
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
