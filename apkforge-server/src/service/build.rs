//! Build Service
//!
//! Business logic between the HTTP handlers and the pipeline: concurrency
//! cap, background builds and status lookups.

use anyhow::Context;
use apkforge_core::domain::build::{BuildParams, BuildStatus};
use apkforge_core::dto::build::{BuildSummary, download_path};
use apkforge_pipeline::artifact::is_artifact_name;
use apkforge_pipeline::{BuildFailure, BuildOutcome, Pipeline, StatusStore};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::Config;

/// Runs builds and answers questions about them
pub struct BuildService {
    pipeline: Pipeline,
    status: StatusStore,
    permits: Semaphore,
    config: Config,
}

impl BuildService {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            status: pipeline.status_store(),
            permits: Semaphore::new(config.max_concurrent_builds),
            pipeline,
            config,
        }
    }

    /// Runs a build to completion
    ///
    /// Waits for a free slot first; the build directory is only created
    /// once the slot is held. The outer error means the build never ran.
    pub async fn build(
        &self,
        build_id: Uuid,
        params: BuildParams,
    ) -> anyhow::Result<Result<BuildOutcome, BuildFailure>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .context("Build slots are closed")?;

        tracing::info!("Build {} acquired a slot", build_id);
        Ok(self.pipeline.run(build_id, params).await)
    }

    /// Runs a build on its own task and waits for the result
    ///
    /// The build carries on to completion or failure if the caller goes away.
    pub async fn run(
        self: &Arc<Self>,
        build_id: Uuid,
        params: BuildParams,
    ) -> anyhow::Result<Result<BuildOutcome, BuildFailure>> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.build(build_id, params).await })
            .await
            .with_context(|| format!("Build task {} ended abnormally", build_id))?
    }

    /// Starts a build in the background
    pub fn spawn(self: &Arc<Self>, build_id: Uuid, params: BuildParams) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            match service.build(build_id, params).await {
                Ok(Ok(outcome)) => tracing::info!(
                    "Background build {} completed: {}",
                    build_id,
                    outcome.artifact_name
                ),
                Ok(Err(failure)) => tracing::error!("Background build failed: {}", failure),
                Err(e) => tracing::error!("Background build {} did not run: {:#}", build_id, e),
            }
        });
    }

    pub async fn status(&self, build_id: Uuid) -> io::Result<BuildStatus> {
        self.status.status_of(build_id).await
    }

    /// Every build, newest first
    pub async fn list(&self) -> io::Result<Vec<BuildSummary>> {
        let records = self.status.list_all().await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let status = record.status.state()?;
                let download_url = record
                    .status
                    .artifact_name()
                    .map(|name| self.download_url(record.build_id, name));
                Some(BuildSummary {
                    build_id: record.build_id,
                    created_at: record.created_at,
                    status,
                    download_url,
                })
            })
            .collect())
    }

    pub fn download_url(&self, build_id: Uuid, artifact_name: &str) -> String {
        self.config
            .download_url(&download_path(build_id, artifact_name))
    }

    /// Location of a downloadable artifact
    ///
    /// Only artifact files directly inside a build directory are served.
    pub fn artifact_file(&self, build_id: Uuid, file: &str) -> Option<PathBuf> {
        let is_plain_name = std::path::Path::new(file)
            .file_name()
            .is_some_and(|name| name == file);
        if !is_plain_name || !is_artifact_name(file) {
            return None;
        }
        Some(self.pipeline.workspace().locate(build_id).join(file))
    }
}
