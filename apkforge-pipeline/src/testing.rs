//! Test doubles for the toolchain and the asset fetcher

use apkforge_core::domain::build::BuildParams;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::archive::pack_directory;
use crate::artifact::TOOLCHAIN_OUTPUT;
use crate::error::{BuildError, Result};
use crate::fetch::AssetFetcher;
use crate::toolchain::{CommandOutput, Invocation, Toolchain, ToolchainError};

pub fn demo_params() -> BuildParams {
    BuildParams {
        app_name: "Demo App".to_string(),
        app_url: "https://example.com".to_string(),
        logo_url: "https://example.com/icon.png".to_string(),
        package_id: "com.example.demo".to_string(),
    }
}

/// Toolchain that records invocations and creates the files the real
/// tools would leave behind
#[derive(Default)]
pub struct ScriptedToolchain {
    invocations: Mutex<Vec<Invocation>>,
    fail_on: Option<String>,
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every command whose command line contains `needle`
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }
}

#[async_trait]
impl Toolchain for ScriptedToolchain {
    async fn run(&self, invocation: &Invocation) -> std::result::Result<CommandOutput, ToolchainError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let command = invocation.command_line();
        if let Some(needle) = &self.fail_on {
            if command.contains(needle.as_str()) {
                return Err(ToolchainError::Failed {
                    command,
                    exit_code: 1,
                    stderr: "boom".to_string(),
                });
            }
        }

        let args = &invocation.args;
        if let Some(pos) = args.iter().position(|a| a == "-keystore") {
            std::fs::write(&args[pos + 1], b"keystore").unwrap();
        }
        if args.iter().map(String::as_str).eq(["build", "apk", "--release"]) {
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

/// Fetcher serving fixed bytes for any URL
#[derive(Default)]
pub struct StaticFetcher {
    urls: Mutex<Vec<String>>,
    fail: bool,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(BuildError::Fetch {
                url: url.to_string(),
                reason: "server responded with status 404 Not Found".to_string(),
            });
        }
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(dest, b"icon").unwrap();
        Ok(4)
    }
}

/// Writes a minimal template project below `root/webview-template-main`
pub fn template_tree(root: &Path) {
    let project = root.join("webview-template-main");
    std::fs::create_dir_all(project.join("android/gradle/wrapper")).unwrap();
    std::fs::create_dir_all(project.join("android/app")).unwrap();
    std::fs::create_dir_all(project.join("assets/icons")).unwrap();
    std::fs::write(project.join(".env"), "APP_URL=APP_URL_PLACEHOLDER\n").unwrap();
    std::fs::write(project.join("pubspec.yaml"), "name: webview_template\n").unwrap();
    std::fs::write(project.join("assets/icons/logo.png"), b"template-icon").unwrap();
    std::fs::write(
        project.join("android/gradle/wrapper/gradle-wrapper.properties"),
        "distributionUrl=https\\://services.gradle.org/distributions/gradle-7.5-all.zip\n",
    )
    .unwrap();
    std::fs::write(
        project.join("android/gradle.properties"),
        "org.gradle.jvmargs=-Xmx4G\nandroid.useAndroidX=true\n",
    )
    .unwrap();
}

/// Packs a minimal template project into `dir/template.zip`
pub fn template_archive(dir: &Path) -> PathBuf {
    let tree = dir.join("template-src");
    template_tree(&tree);
    let archive = dir.join("template.zip");
    pack_directory(&tree, &archive).unwrap();
    archive
}
