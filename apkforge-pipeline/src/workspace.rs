//! Build directory management
//!
//! Owns the lifecycle of the per-build directories under the public builds
//! root. Directory names are build ids, so two builds can never share one.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BuildError, Result};

/// The public builds root and the per-build directories below it
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a build's directory, whether or not it exists
    pub fn locate(&self, build_id: Uuid) -> PathBuf {
        self.root.join(build_id.to_string())
    }

    /// Allocates a fresh directory for a build
    ///
    /// Fails if the directory already exists; an existing directory is
    /// never adopted.
    pub async fn create(&self, build_id: Uuid) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BuildError::workspace(&self.root, e))?;

        let dir = self.locate(build_id);
        tokio::fs::create_dir(&dir)
            .await
            .map_err(|e| BuildError::workspace(&dir, e))?;

        info!("Created build directory {}", dir.display());
        Ok(dir)
    }

    /// Removes a build directory and everything in it
    ///
    /// Removing a missing directory is not an error.
    pub async fn destroy(&self, build_id: Uuid) -> io::Result<()> {
        let dir = self.locate(build_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!("Removed build directory {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Build directory {} already absent", dir.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn exists(&self, build_id: Uuid) -> bool {
        tokio::fs::metadata(self.locate(build_id))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
