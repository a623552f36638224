//! Build-related API endpoints

use crate::ApkforgeClient;
use crate::error::{ClientError, Result};
use apkforge_core::dto::build::{
    BuildAccepted, BuildCompleted, BuildList, BuildStatusResponse, CreateBuild,
};
use std::path::Path;
use uuid::Uuid;

impl ApkforgeClient {
    // =============================================================================
    // Builds
    // =============================================================================

    /// Run a build and wait for its artifact
    ///
    /// The request blocks until the server finishes the whole pipeline.
    pub async fn build(&self, req: CreateBuild) -> Result<BuildCompleted> {
        let url = format!("{}/build", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Start a build in the background
    ///
    /// Returns as soon as the request is validated; poll
    /// [`build_status`](Self::build_status) to follow it.
    pub async fn build_detached(&self, req: CreateBuild) -> Result<BuildAccepted> {
        let url = format!("{}/build?detach=true", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the status of a build
    pub async fn build_status(&self, build_id: Uuid) -> Result<BuildStatusResponse> {
        let url = format!("{}/build-status/{}", self.base_url, build_id);
        let response = self.client.get(&url).send().await?;

        match self.handle_response(response).await {
            Err(e) if e.is_not_found() => {
                Err(ClientError::NotFound(format!("Build {}", build_id)))
            }
            other => other,
        }
    }

    /// List all builds, newest first
    pub async fn list_builds(&self) -> Result<BuildList> {
        let url = format!("{}/builds", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Download an artifact to `dest`
    ///
    /// `download_url` is the value reported by the server, absolute or
    /// relative to the base URL. Returns the number of bytes written.
    pub async fn download(&self, download_url: &str, dest: &Path) -> Result<u64> {
        let url = self.resolve(download_url);
        tracing::debug!("Downloading {} to {}", url, dest.display());

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status.as_u16(), &text));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| ClientError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        Ok(bytes.len() as u64)
    }
}
