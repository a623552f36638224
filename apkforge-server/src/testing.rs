//! Test doubles wiring a real pipeline to fake external tools

use apkforge_core::domain::build::BuildParams;
use apkforge_pipeline::artifact::TOOLCHAIN_OUTPUT;
use apkforge_pipeline::toolchain::{CommandOutput, Invocation, ToolchainError};
use apkforge_pipeline::{
    AssetFetcher, BuildError, Pipeline, PipelineConfig, TemplateSource, Toolchain,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::service::BuildService;

pub fn demo_params() -> BuildParams {
    BuildParams {
        app_name: "Demo App".to_string(),
        app_url: "https://example.com".to_string(),
        logo_url: "https://example.com/icon.png".to_string(),
        package_id: "com.example.demo".to_string(),
    }
}

#[derive(Default)]
struct Counters {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Toolchain producing the files real tools would, optionally failing
#[derive(Clone, Default)]
pub struct FakeToolchain {
    fail_on: Option<String>,
    counters: Arc<Counters>,
}

impl FakeToolchain {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    /// Highest number of release builds observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolchainError> {
        let command = invocation.command_line();

        if self.fail_on.as_ref().is_some_and(|n| command.contains(n.as_str())) {
            return Err(ToolchainError::Failed {
                command,
                exit_code: 1,
                stderr: "gradle exploded".to_string(),
            });
        }

        let args = &invocation.args;
        if let Some(pos) = args.iter().position(|a| a == "-keystore") {
            std::fs::write(&args[pos + 1], b"keystore").unwrap();
        }
        if command.ends_with("build apk --release") {
            let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);

            let output = invocation.working_dir.join(TOOLCHAIN_OUTPUT);
            std::fs::create_dir_all(output.parent().unwrap()).unwrap();
            std::fs::write(&output, b"signed-apk").unwrap();
        }

        Ok(CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

pub struct FakeFetcher;

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str, dest: &Path) -> Result<u64, BuildError> {
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(dest, b"icon").unwrap();
        Ok(4)
    }
}

fn write_template(root: &Path) {
    let project = root.join("webview-template-main");
    std::fs::create_dir_all(project.join("android/gradle/wrapper")).unwrap();
    std::fs::create_dir_all(project.join("android/app")).unwrap();
    std::fs::write(project.join(".env"), "APP_URL=APP_URL_PLACEHOLDER\n").unwrap();
    std::fs::write(
        project.join("android/gradle/wrapper/gradle-wrapper.properties"),
        "distributionUrl=https\\://services.gradle.org/distributions/gradle-7.5-all.zip\n",
    )
    .unwrap();
}

/// Build service over `root/builds` with a template copied from `root/template`
pub fn test_service(
    root: &Path,
    toolchain: FakeToolchain,
    fetcher: FakeFetcher,
    max_concurrent_builds: usize,
) -> BuildService {
    let template = root.join("template");
    write_template(&template);

    let config = Config {
        max_concurrent_builds,
        pipeline: PipelineConfig {
            builds_root: root.join("builds"),
            template: TemplateSource::Directory(template),
            ..PipelineConfig::default()
        },
        ..Config::default()
    };

    let pipeline = Pipeline::new(config.pipeline.clone(), Arc::new(toolchain), Arc::new(fetcher));
    BuildService::new(config, pipeline)
}
