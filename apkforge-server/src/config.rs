//! Server configuration
//!
//! Defines the listen address, the concurrency cap and every pipeline
//! setting an operator may override through the environment.

use apkforge_pipeline::{PipelineConfig, TemplateSource};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Prefix for download URLs (e.g., "https://apk.example.com")
    pub public_base_url: Option<String>,

    /// Builds allowed to run at the same time
    pub max_concurrent_builds: usize,

    pub pipeline: PipelineConfig,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// All variables are optional:
    /// - APKFORGE_BIND_ADDR (default: 0.0.0.0:3000)
    /// - APKFORGE_BUILDS_ROOT (default: builds)
    /// - APKFORGE_TEMPLATE_ARCHIVE (default: ../webview-template-main.zip)
    /// - APKFORGE_TEMPLATE_DIR (overrides the archive when set)
    /// - APKFORGE_TEMPLATE_ROOT (default: webview-template-main)
    /// - PUBLIC_BASE_URL
    /// - MAX_CONCURRENT_BUILDS (default: 1)
    /// - FLUTTER_BIN / KEYTOOL_BIN (default: flutter / keytool)
    /// - COMMAND_TIMEOUT / BUILD_TIMEOUT (seconds, default: 600 / 1800)
    /// - GRADLE_VERSION (default: 8.4)
    /// - GRADLE_MAX_WORKERS / GRADLE_MAX_HEAP (default: 2 / 1536m)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = var("APKFORGE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.public_base_url = var("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string());
        if let Some(n) = var("MAX_CONCURRENT_BUILDS") {
            config.max_concurrent_builds = n
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_CONCURRENT_BUILDS must be a number, got '{}'", n))?;
        }

        let pipeline = &mut config.pipeline;
        if let Some(root) = var("APKFORGE_BUILDS_ROOT") {
            pipeline.builds_root = PathBuf::from(root);
        }
        if let Some(archive) = var("APKFORGE_TEMPLATE_ARCHIVE") {
            pipeline.template = TemplateSource::Archive(PathBuf::from(archive));
        }
        if let Some(dir) = var("APKFORGE_TEMPLATE_DIR") {
            pipeline.template = TemplateSource::Directory(PathBuf::from(dir));
        }
        // An explicitly empty root means the template sits at the top of the build directory
        if let Some(root) = lookup("APKFORGE_TEMPLATE_ROOT") {
            pipeline.template_root = PathBuf::from(root.trim());
        }

        if let Some(bin) = var("FLUTTER_BIN") {
            pipeline.toolchain.flutter_bin = bin;
        }
        if let Some(bin) = var("KEYTOOL_BIN") {
            pipeline.toolchain.keytool_bin = bin;
        }
        if let Some(secs) = var("COMMAND_TIMEOUT") {
            pipeline.toolchain.command_timeout = parse_seconds("COMMAND_TIMEOUT", &secs)?;
        }
        if let Some(secs) = var("BUILD_TIMEOUT") {
            pipeline.toolchain.build_timeout = parse_seconds("BUILD_TIMEOUT", &secs)?;
        }

        if let Some(version) = var("GRADLE_VERSION") {
            pipeline.patch.gradle_version = version;
        }
        if let Some(workers) = var("GRADLE_MAX_WORKERS") {
            pipeline.patch.gradle_max_workers = workers.parse().map_err(|_| {
                anyhow::anyhow!("GRADLE_MAX_WORKERS must be a number, got '{}'", workers)
            })?;
        }
        if let Some(heap) = var("GRADLE_MAX_HEAP") {
            pipeline.patch.gradle_max_heap = heap;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let Some(url) = &self.public_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("PUBLIC_BASE_URL must start with http:// or https://");
            }
        }

        if self.max_concurrent_builds == 0 {
            anyhow::bail!("max_concurrent_builds must be greater than 0");
        }

        let toolchain = &self.pipeline.toolchain;
        if toolchain.command_timeout.is_zero() || toolchain.build_timeout.is_zero() {
            anyhow::bail!("toolchain timeouts must be greater than 0");
        }

        if self.pipeline.patch.gradle_max_workers == 0 {
            anyhow::bail!("gradle_max_workers must be greater than 0");
        }

        if self.pipeline.template_root.is_absolute()
            || self
                .pipeline
                .template_root
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            anyhow::bail!("template_root must be a relative path inside the build directory");
        }

        Ok(())
    }

    /// Download URL of a published artifact
    pub fn download_url(&self, path: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}{}", base, path),
            None => path.to_string(),
        }
    }
}

fn parse_seconds(key: &str, value: &str) -> anyhow::Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| anyhow::anyhow!("{} must be a number of seconds, got '{}'", key, value))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            public_base_url: None,
            max_concurrent_builds: 1,
            pipeline: PipelineConfig::default(),
        }
    }
}
