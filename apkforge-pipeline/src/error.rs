//! Error types for the build pipeline

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::toolchain::ToolchainError;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// A fatal stage failure
///
/// Every variant aborts the job; none is retried. Messages are meant for
/// the caller and never embed captured toolchain output.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The build directory could not be created or written
    #[error("Build directory error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The template could not be materialized
    #[error("Template extraction failed: {0}")]
    Extraction(String),

    /// A remote asset could not be downloaded
    #[error("Failed to download {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A template file could not be edited
    #[error("Failed to patch {}: {reason}", path.display())]
    Patch { path: PathBuf, reason: String },

    /// An external command failed, timed out or could not start
    #[error("Toolchain command failed: {0}")]
    Toolchain(#[from] ToolchainError),

    /// Signing material could not be generated
    #[error("Failed to provision signing material: {0}")]
    Provisioning(String),

    /// The toolchain reported success but produced no package
    #[error("Build artifact not found at {}", path.display())]
    ArtifactNotFound { path: PathBuf },
}

impl BuildError {
    /// Stable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::Workspace { .. } => "WorkspaceError",
            BuildError::Extraction(_) => "ExtractionError",
            BuildError::Fetch { .. } => "FetchError",
            BuildError::Patch { .. } => "PatchError",
            BuildError::Toolchain(_) => "ToolchainError",
            BuildError::Provisioning(_) => "ProvisioningError",
            BuildError::ArtifactNotFound { .. } => "ArtifactNotFoundError",
        }
    }

    /// Captured error output of a failed command, for server-side logs
    pub fn stderr(&self) -> Option<&str> {
        match self {
            BuildError::Toolchain(err) => err.stderr(),
            _ => None,
        }
    }

    pub(crate) fn workspace(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Workspace {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn patch(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BuildError::Patch {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn fetch(url: &str, reason: impl ToString) -> Self {
        BuildError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
