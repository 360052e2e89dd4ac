//! Service descriptor.
//!
//! Per Iron Lotus Framework: Configuration is validated at load time (Poka-Yoke),
//! with sensible defaults and clear error messages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, ServiceError};

/// Portable description of the program to run as a native service.
///
/// # Toyota Way: Standardized Work (標準作業)
/// One descriptor drives every backend. The native artifact's identity
/// (plist label, unit name) derives solely from [`label`](Self::label):
/// two descriptors sharing a label denote the same service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Human-friendly service name. Used for log paths and as the Windows
    /// service name.
    pub name: String,

    /// Globally unique identifier for the manager (e.g. `com.example.agent`).
    pub label: String,

    /// Path of the program to run.
    pub program: PathBuf,

    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Documentation URL.
    #[serde(default)]
    pub documentation: Option<String>,

    /// Run the Windows control loop interactively instead of under the SCM.
    #[serde(default)]
    pub debug: bool,
}

impl ServiceDescriptor {
    /// Creates a descriptor with the required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        program: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            description: String::new(),
            documentation: None,
            debug: false,
        }
    }

    /// Sets the program arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the documentation URL.
    #[must_use]
    pub fn with_documentation(mut self, url: impl Into<String>) -> Self {
        self.documentation = Some(url.into());
        self
    }

    /// Enables or disables debug mode.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The full command line: program followed by its arguments.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Validates the descriptor.
    ///
    /// # Errors
    /// Returns an error if the descriptor is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::config("name cannot be empty"));
        }
        // The name becomes a directory component of the launchd log path.
        if self.name.contains(['/', '\\']) {
            return Err(ServiceError::config(
                "name must not contain path separators",
            ));
        }

        if self.label.is_empty() {
            return Err(ServiceError::config("label cannot be empty"));
        }
        if self.label.chars().any(char::is_whitespace) || self.label.contains(['/', '\\']) {
            return Err(ServiceError::config(
                "label must not contain whitespace or path separators",
            ));
        }

        if self.program.as_os_str().is_empty() {
            return Err(ServiceError::config("program cannot be empty"));
        }

        if let Some(doc) = &self.documentation {
            if doc.trim().is_empty() {
                return Err(ServiceError::config(
                    "documentation must be omitted rather than empty",
                ));
            }
        }

        if self.name.chars().any(char::is_whitespace) {
            tracing::warn!(name = %self.name, "service name contains whitespace");
        }

        Ok(())
    }

    /// Loads a descriptor from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ServiceError::config(format!("failed to read config: {e}")))?;
        let descriptor: Self = toml::from_str(&content)
            .map_err(|e| ServiceError::config(format!("failed to parse config: {e}")))?;
        descriptor.validate()?;
        Ok(descriptor)
    }
}
