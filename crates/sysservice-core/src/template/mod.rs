//! Native configuration artifacts.
//!
//! Artifacts are rebuilt from the descriptor and the environment on every
//! operation. Rendering is pure: the same inputs always produce the same text.

mod plist;
mod unit;

pub use plist::PropertyList;
pub use unit::UnitFile;

use std::path::{Path, PathBuf};

use crate::error::{Result, ServiceError};

/// A configuration file consumed by a native service manager.
pub trait Artifact {
    /// Where the manager expects the file.
    fn path(&self) -> PathBuf;

    /// Renders the file contents.
    fn render(&self) -> Result<String>;
}

/// Renders `artifact` and writes it to its path with mode 0644, creating
/// parent directories as needed.
pub async fn write_artifact<A: Artifact + ?Sized>(artifact: &A) -> Result<PathBuf> {
    let path = artifact.path();
    let content = artifact.render()?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, content.as_bytes()).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).await?;
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote service artifact");
    Ok(path)
}

/// Deletes an artifact file. A missing file is not an error.
pub async fn remove_artifact(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "artifact already absent");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Path as UTF-8 text for embedding into an artifact.
fn path_text(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| ServiceError::template(format!("path is not valid UTF-8: {}", path.display())))
}
