//! Execution context for build jobs
//!
//! Contains all state a stage may read or extend:
//! - The job itself (parameters, directories, stage history)
//! - The pipeline configuration
//! - The collaborators stages delegate to (workspace, toolchain, fetcher)

use apkforge_core::domain::build::BuildParams;
use apkforge_core::domain::stage::StageResult;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::fetch::AssetFetcher;
use crate::toolchain::{Invocation, Toolchain};
use crate::workspace::Workspace;

/// Environment variable exposing the build id to toolchain commands
pub const BUILD_ID_ENV: &str = "APKFORGE_BUILD_ID";

/// One request's end-to-end pipeline execution
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub id: Uuid,
    pub params: BuildParams,
    /// Directory exclusively owned by this job
    pub build_dir: PathBuf,
    /// Template project inside `build_dir`
    pub project_dir: PathBuf,
    /// Results of the stages run so far, in execution order
    pub stage_results: Vec<StageResult>,
    /// Published artifact, set by the last stage
    pub artifact_path: Option<PathBuf>,
    /// Whether this job created `build_dir` and may therefore remove it
    pub owns_directory: bool,
}

impl BuildJob {
    pub fn new(id: Uuid, params: BuildParams, build_dir: PathBuf, project_dir: PathBuf) -> Self {
        Self {
            id,
            params,
            build_dir,
            project_dir,
            stage_results: Vec::new(),
            artifact_path: None,
            owns_directory: false,
        }
    }
}

/// State handed to every stage of a job
pub struct BuildContext<'a> {
    pub job: BuildJob,
    pub config: &'a PipelineConfig,
    pub workspace: &'a Workspace,
    pub toolchain: &'a dyn Toolchain,
    pub fetcher: &'a dyn AssetFetcher,
}

impl BuildContext<'_> {
    /// Starts a command running inside the job's project directory
    ///
    /// Carries the configured environment overrides, the build id and the
    /// default command timeout.
    pub fn invocation(&self, program: &str) -> Invocation {
        let settings = &self.config.toolchain;
        let mut invocation = Invocation::new(program, &self.job.project_dir)
            .envs(&settings.env)
            .timeout(settings.command_timeout);
        invocation
            .env
            .insert(BUILD_ID_ENV.to_string(), self.job.id.to_string());
        invocation
    }

    pub fn flutter(&self) -> Invocation {
        self.invocation(&self.config.toolchain.flutter_bin)
    }

    pub fn keytool(&self) -> Invocation {
        self.invocation(&self.config.toolchain.keytool_bin)
    }
}
