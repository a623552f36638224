//! Pipeline stages
//!
//! A build is an ordered list of stages run one after the other against a
//! shared [`BuildContext`]. Each stage either extends the job and reports a
//! short message, or fails the whole build.

use async_trait::async_trait;
use tracing::info;

use crate::archive::{copy_tree, extract_archive};
use crate::artifact::publish_artifact;
use crate::config::TemplateSource;
use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::patch::ConfigPatcher;
use crate::signing::SigningProvisioner;

/// One sequential step of a build
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable stage name, recorded in stage results
    fn name(&self) -> &'static str;

    /// Runs the stage and returns a summary of what it did
    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String>;
}

/// The full pipeline, in execution order
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(CreateDirectory),
        Box::new(MaterializeTemplate),
        Box::new(PatchConfig),
        Box::new(RunFlutter(FlutterStep::FetchDependencies)),
        Box::new(RunFlutter(FlutterStep::RenameApp)),
        Box::new(FetchIcon),
        Box::new(RunFlutter(FlutterStep::GenerateIcons)),
        Box::new(RunFlutter(FlutterStep::RenamePackage)),
        Box::new(ProvisionSigning),
        Box::new(RunFlutter(FlutterStep::BuildRelease)),
        Box::new(PublishArtifact),
    ]
}

/// Allocates the job's build directory
pub struct CreateDirectory;

#[async_trait]
impl Stage for CreateDirectory {
    fn name(&self) -> &'static str {
        "create-directory"
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let dir = ctx.workspace.create(ctx.job.id).await?;
        ctx.job.owns_directory = true;
        Ok(format!("Created {}", dir.display()))
    }
}

/// Copies the template project into the build directory
pub struct MaterializeTemplate;

#[async_trait]
impl Stage for MaterializeTemplate {
    fn name(&self) -> &'static str {
        "materialize-template"
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let source = ctx.config.template.clone();
        let dest = ctx.job.build_dir.clone();

        let files = tokio::task::spawn_blocking(move || match source {
            TemplateSource::Archive(archive) => extract_archive(&archive, &dest),
            TemplateSource::Directory(dir) => copy_tree(&dir, &dest),
        })
        .await
        .map_err(|e| BuildError::Extraction(format!("materialization task failed: {}", e)))??;

        let project_dir = &ctx.job.project_dir;
        if !tokio::fs::metadata(project_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(BuildError::Extraction(format!(
                "template does not contain the project directory {}",
                ctx.config.template_root.display()
            )));
        }

        Ok(format!("Materialized {} template file(s)", files))
    }
}

/// Applies the configured edits to the template files
pub struct PatchConfig;

#[async_trait]
impl Stage for PatchConfig {
    fn name(&self) -> &'static str {
        "patch-config"
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        ConfigPatcher::new(&ctx.config.patch)
            .apply(&ctx.job.project_dir, &ctx.job.params.app_url)
            .await
    }
}

/// Flutter commands of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlutterStep {
    FetchDependencies,
    RenameApp,
    GenerateIcons,
    RenamePackage,
    BuildRelease,
}

impl FlutterStep {
    pub fn name(&self) -> &'static str {
        match self {
            FlutterStep::FetchDependencies => "fetch-dependencies",
            FlutterStep::RenameApp => "rename-app",
            FlutterStep::GenerateIcons => "generate-icons",
            FlutterStep::RenamePackage => "rename-package",
            FlutterStep::BuildRelease => "build-release",
        }
    }

    /// Command arguments; user values are passed as single arguments
    pub fn args(&self, ctx: &BuildContext<'_>) -> Vec<String> {
        let params = &ctx.job.params;
        let rename = |command: &str, value: &str| {
            ["pub", "run", "rename", command, "--targets", "android,ios", "--value", value]
                .map(String::from)
                .to_vec()
        };

        match self {
            FlutterStep::FetchDependencies => vec!["pub".into(), "get".into()],
            FlutterStep::RenameApp => rename("setAppName", &params.app_name),
            FlutterStep::GenerateIcons => {
                vec!["pub".into(), "run".into(), "flutter_launcher_icons:main".into()]
            }
            FlutterStep::RenamePackage => rename("setBundleId", &params.package_id),
            FlutterStep::BuildRelease => vec!["build".into(), "apk".into(), "--release".into()],
        }
    }
}

pub struct RunFlutter(pub FlutterStep);

#[async_trait]
impl Stage for RunFlutter {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let mut invocation = ctx.flutter().args(self.0.args(ctx));
        if self.0 == FlutterStep::BuildRelease {
            invocation = invocation.timeout(ctx.config.toolchain.build_timeout);
        }

        let command = invocation.command_line();
        info!("Running {}", command);
        ctx.toolchain.run(&invocation).await?;
        Ok(format!("Ran {}", command))
    }
}

/// Downloads the launcher icon over the template's icon
pub struct FetchIcon;

#[async_trait]
impl Stage for FetchIcon {
    fn name(&self) -> &'static str {
        "fetch-icon"
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let dest = ctx.job.project_dir.join(&ctx.config.patch.icon_path);
        let bytes = ctx.fetcher.fetch(&ctx.job.params.logo_url, &dest).await?;
        Ok(format!("Downloaded icon ({} bytes)", bytes))
    }
}

/// Generates the release signing material
pub struct ProvisionSigning;

#[async_trait]
impl Stage for ProvisionSigning {
    fn name(&self) -> &'static str {
        "provision-signing"
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let material = SigningProvisioner::new(&ctx.config.signing)
            .provision(ctx.toolchain, ctx.keytool())
            .await?;
        Ok(format!("Generated {}", material.keystore.display()))
    }
}

/// Copies the release package to its public location
pub struct PublishArtifact;

#[async_trait]
impl Stage for PublishArtifact {
    fn name(&self) -> &'static str {
        "publish-artifact"
    }

    async fn run(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let published = publish_artifact(
            &ctx.job.project_dir,
            &ctx.job.build_dir,
            &ctx.job.params.app_name,
        )
        .await?;
        let message = format!("Published {}", published.display());
        ctx.job.artifact_path = Some(published);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_order() {
        let names: Vec<_> = default_stages().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "create-directory",
                "materialize-template",
                "patch-config",
                "fetch-dependencies",
                "rename-app",
                "fetch-icon",
                "generate-icons",
                "rename-package",
                "provision-signing",
                "build-release",
                "publish-artifact",
            ]
        );
    }
}
