//! Build DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::build::{BuildParams, BuildState};
use crate::error::ValidationError;

/// Wire names of the fields every build request must carry
pub const REQUIRED_FIELDS: [&str; 4] = ["appName", "appUrl", "logoUrl", "packageId"];

/// Public path under which artifacts are served
pub fn download_path(build_id: Uuid, artifact_name: &str) -> String {
    format!("/builds/{}/{}", build_id, artifact_name)
}

/// Request to build a new application package
///
/// Every field is optional at the deserialization level so that a missing
/// field is reported as a validation error rather than a parse failure.
/// The snake_case names used by earlier clients are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuild {
    #[serde(default, alias = "app_name", skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, alias = "app_url", skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(default, alias = "logo_url", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(
        default,
        alias = "package_id",
        alias = "package_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub package_id: Option<String>,
}

impl CreateBuild {
    /// Validates presence of every field and produces the job parameters
    ///
    /// Values are trimmed; a field that is blank after trimming counts as
    /// missing.
    pub fn validate(self) -> Result<BuildParams, ValidationError> {
        let fields = [self.app_name, self.app_url, self.logo_url, self.package_id];

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(fields.len());
        for (name, value) in REQUIRED_FIELDS.iter().zip(fields) {
            match value.map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => values.push(v),
                _ => missing.push(*name),
            }
        }

        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        let mut values = values.into_iter();
        Ok(BuildParams {
            app_name: values.next().unwrap_or_default(),
            app_url: values.next().unwrap_or_default(),
            logo_url: values.next().unwrap_or_default(),
            package_id: values.next().unwrap_or_default(),
        })
    }
}

impl From<BuildParams> for CreateBuild {
    fn from(params: BuildParams) -> Self {
        Self {
            app_name: Some(params.app_name),
            app_url: Some(params.app_url),
            logo_url: Some(params.logo_url),
            package_id: Some(params.package_id),
        }
    }
}

/// Response of a build that ran to completion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCompleted {
    pub success: bool,
    pub build_id: Uuid,
    pub message: String,
    pub download_url: String,
    pub artifact_path: String,
    pub params: BuildParams,
}

/// Response of a build started in the background
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAccepted {
    pub success: bool,
    pub build_id: Uuid,
    pub status_url: String,
}

/// Response of a build whose pipeline failed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildFailed {
    pub error: String,
    pub message: String,
    pub build_id: Uuid,
}

/// Response of a request rejected for missing fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingFields {
    pub error: String,
    pub required: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

impl From<ValidationError> for MissingFields {
    fn from(err: ValidationError) -> Self {
        Self {
            error: "Missing required fields".to_string(),
            required: REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
            missing: err.missing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Status of a single build
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatusResponse {
    pub status: BuildState,
    pub build_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// One entry of the build listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub build_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: BuildState,
    pub download_url: Option<String>,
}

/// All known builds, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildList {
    pub builds: Vec<BuildSummary>,
}
