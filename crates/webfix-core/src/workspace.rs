//! Isolated, uniquely named working directories.
//!
//! [`WorkspaceManager::acquire`] creates a fresh empty directory and hands out
//! a [`Workspace`] guard. The guard is released exactly once: either through
//! [`Workspace::release`], which consumes it, or by `Drop` as a backstop when
//! the owning future panics or is dropped mid-flight.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Result, WebfixError};

const WORKSPACE_PREFIX: &str = "webfix-";

/// Creates workspaces under a common root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, empty workspace directory.
    ///
    /// Fails with [`WebfixError::WorkspaceCreation`] if the directory already
    /// exists or the filesystem refuses to create it.
    pub fn acquire(&self) -> Result<Workspace> {
        std::fs::create_dir_all(&self.root).map_err(|source| WebfixError::WorkspaceCreation {
            path: self.root.clone(),
            source,
        })?;

        let id = format!(
            "{WORKSPACE_PREFIX}{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S"),
            Uuid::new_v4().simple()
        );
        let path = self.root.join(&id);

        // Non-recursive: an existing path is an error, never reused.
        std::fs::create_dir(&path).map_err(|source| WebfixError::WorkspaceCreation {
            path: path.clone(),
            source,
        })?;

        debug!(workspace = %path.display(), "workspace acquired");
        Ok(Workspace {
            id,
            path,
            released: false,
        })
    }
}

/// Exclusive handle on one workspace directory.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Unique identifier, also the directory name.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace tree.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        release_path(&self.path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = release_path(&self.path) {
            warn!(workspace = %self.path.display(), error = %err, "workspace cleanup on drop failed");
        }
    }
}

/// Recursively remove `path`. An already absent path is not an error.
pub fn release_path(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(workspace = %path.display(), "workspace released");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(WebfixError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}
