//! Facts about the invoking user.
//!
//! Artifact locations bifurcate on privilege: a root user manages
//! system-wide services, everyone else manages per-user ones.

use std::path::{Path, PathBuf};

/// Identity of the user performing service operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFacts {
    username: String,
    home_dir: PathBuf,
    elevated: bool,
}

impl EnvFacts {
    /// Creates facts from explicit values.
    #[must_use]
    pub fn new(username: impl Into<String>, home_dir: impl Into<PathBuf>, elevated: bool) -> Self {
        Self {
            username: username.into(),
            home_dir: home_dir.into(),
            elevated,
        }
    }

    /// Detects the current user.
    ///
    /// On unix, elevated means uid 0 or gid 0.
    #[cfg(unix)]
    #[must_use]
    pub fn detect() -> Self {
        use nix::unistd::{Uid, User, getgid, getuid};

        let uid: Uid = getuid();
        let elevated = uid.is_root() || getgid().as_raw() == 0;

        let entry = User::from_uid(uid).ok().flatten();
        let username = entry
            .as_ref()
            .map(|u| u.name.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default();
        let home_dir = entry
            .map(|u| u.dir)
            .or_else(dirs_next::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));

        tracing::trace!(username = %username, elevated, "detected user environment");
        Self::new(username, home_dir, elevated)
    }

    /// Detects the current user.
    ///
    /// The Windows backend does not bifurcate on privilege, so this is never
    /// elevated.
    #[cfg(not(unix))]
    #[must_use]
    pub fn detect() -> Self {
        let username = std::env::var("USERNAME").unwrap_or_default();
        let home_dir = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(username, home_dir, false)
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Home directory.
    #[must_use]
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Whether the user manages system-wide services.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        self.elevated
    }
}

/// Returns true if `path` names an existing regular file.
#[must_use]
pub fn file_exists(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
