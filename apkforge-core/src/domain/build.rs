//! Build domain types

use serde::{Deserialize, Serialize};

/// Customization parameters of a build
///
/// Accepted once per job and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildParams {
    /// Display name of the generated application
    pub app_name: String,
    /// URL the application opens
    pub app_url: String,
    /// URL of the launcher icon image
    pub logo_url: String,
    /// Android application id (e.g. `com.example.demo`)
    pub package_id: String,
}

/// Coarse build state as reported over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Building,
    Completed,
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildState::Building => write!(f, "building"),
            BuildState::Completed => write!(f, "completed"),
        }
    }
}

/// Status of a build derived from its directory
///
/// Never stored: the presence of the artifact file is the only record
/// of completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// No directory exists for the build id
    NotFound,
    /// The directory exists but holds no artifact yet
    Building,
    /// The artifact file is present in the build directory
    Completed { artifact_name: String },
}

impl BuildStatus {
    /// Returns the API-facing state, or `None` for an unknown build
    pub fn state(&self) -> Option<BuildState> {
        match self {
            BuildStatus::NotFound => None,
            BuildStatus::Building => Some(BuildState::Building),
            BuildStatus::Completed { .. } => Some(BuildState::Completed),
        }
    }

    /// Name of the artifact file when the build is completed
    pub fn artifact_name(&self) -> Option<&str> {
        match self {
            BuildStatus::Completed { artifact_name } => Some(artifact_name),
            _ => None,
        }
    }
}
