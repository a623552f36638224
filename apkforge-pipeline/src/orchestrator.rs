//! Pipeline orchestration
//!
//! Runs the stage list of one build to completion or to its first failure.
//! A failed build leaves nothing behind: the directory it created is
//! removed before the failure is returned.

use apkforge_core::domain::build::BuildParams;
use apkforge_core::domain::stage::StageResult;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::context::{BuildContext, BuildJob};
use crate::error::BuildError;
use crate::fetch::AssetFetcher;
use crate::stage::{Stage, default_stages};
use crate::status::StatusStore;
use crate::toolchain::Toolchain;
use crate::workspace::Workspace;

/// A build that produced its artifact
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub build_id: Uuid,
    pub artifact_path: PathBuf,
    pub artifact_name: String,
    pub stage_results: Vec<StageResult>,
}

/// A build aborted by a stage failure
#[derive(Debug, Error)]
#[error("Build {build_id} failed at stage {stage}: {error}")]
pub struct BuildFailure {
    pub build_id: Uuid,
    pub stage: String,
    #[source]
    pub error: BuildError,
    pub stage_results: Vec<StageResult>,
}

/// Removes the build directory if a run is dropped before it finishes
///
/// Armed only while the run owns the directory.
struct DropCleanup {
    dir: PathBuf,
    armed: bool,
}

impl Drop for DropCleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(
            "Build abandoned before finishing, removing {}",
            self.dir.display()
        );
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!(
                "Failed to remove build directory {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}

/// The build pipeline
pub struct Pipeline {
    config: PipelineConfig,
    workspace: Workspace,
    toolchain: Arc<dyn Toolchain>,
    fetcher: Arc<dyn AssetFetcher>,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        toolchain: Arc<dyn Toolchain>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        let workspace = Workspace::new(config.builds_root.clone());
        Self {
            config,
            workspace,
            toolchain,
            fetcher,
            stages: default_stages(),
        }
    }

    /// Replaces the stage list
    pub fn with_stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = stages;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Status lookups over the same builds root
    pub fn status_store(&self) -> StatusStore {
        StatusStore::new(self.workspace.clone())
    }

    /// Runs every stage of a build in order
    pub async fn run(
        &self,
        build_id: Uuid,
        params: BuildParams,
    ) -> Result<BuildOutcome, BuildFailure> {
        let span = info_span!("build", build_id = %build_id);
        self.execute(build_id, params).instrument(span).await
    }

    async fn execute(
        &self,
        build_id: Uuid,
        params: BuildParams,
    ) -> Result<BuildOutcome, BuildFailure> {
        let build_dir = self.workspace.locate(build_id);
        let project_dir = build_dir.join(&self.config.template_root);

        info!(
            "Starting build of '{}' ({})",
            params.app_name, params.package_id
        );

        let mut cleanup = DropCleanup {
            dir: build_dir.clone(),
            armed: false,
        };

        let mut ctx = BuildContext {
            job: BuildJob::new(build_id, params, build_dir, project_dir),
            config: &self.config,
            workspace: &self.workspace,
            toolchain: self.toolchain.as_ref(),
            fetcher: self.fetcher.as_ref(),
        };

        for stage in &self.stages {
            info!("Stage {} started", stage.name());
            match stage.run(&mut ctx).await {
                Ok(message) => {
                    info!("Stage {} finished: {}", stage.name(), message);
                    ctx.job
                        .stage_results
                        .push(StageResult::succeeded(stage.name(), message));
                    cleanup.armed = ctx.job.owns_directory;
                }
                Err(err) => {
                    let failure = self.abort(ctx.job, stage.name(), err).await;
                    cleanup.armed = false;
                    return Err(failure);
                }
            }
        }

        let Some(artifact_path) = ctx.job.artifact_path.clone() else {
            let err = BuildError::ArtifactNotFound {
                path: ctx.job.build_dir.clone(),
            };
            let failure = self.abort(ctx.job, "publish-artifact", err).await;
            cleanup.armed = false;
            return Err(failure);
        };
        cleanup.armed = false;

        let artifact_name = artifact_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        info!("Build completed: {}", artifact_name);
        Ok(BuildOutcome {
            build_id,
            artifact_path,
            artifact_name,
            stage_results: ctx.job.stage_results,
        })
    }

    /// Records the failure and removes the job's directory
    async fn abort(&self, mut job: BuildJob, stage: &str, err: BuildError) -> BuildFailure {
        error!("Stage {} failed: {}", stage, err);
        if let Some(stderr) = err.stderr() {
            error!("Captured toolchain output:\n{}", stderr.trim_end());
        }

        job.stage_results
            .push(StageResult::failed(stage, err.to_string()));

        if job.owns_directory {
            if let Err(e) = self.workspace.destroy(job.id).await {
                error!(
                    "Failed to remove build directory {}: {}",
                    job.build_dir.display(),
                    e
                );
            }
        }

        BuildFailure {
            build_id: job.id,
            stage: stage.to_string(),
            error: err,
            stage_results: job.stage_results,
        }
    }
}
