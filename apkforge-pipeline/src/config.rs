//! Pipeline configuration
//!
//! Everything that varies between deployments of the pipeline: where builds
//! live, which template is materialized, how the toolchain is invoked and
//! which edits are applied to the template. Variants of the pipeline are
//! expressed here rather than as separate code paths.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Where the template project comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A zip archive extracted into each build directory
    Archive(PathBuf),
    /// A pre-patched template tree copied into each build directory
    Directory(PathBuf),
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Public root holding one directory per build
    pub builds_root: PathBuf,

    /// Template materialized into every build directory
    pub template: TemplateSource,

    /// Directory of the project inside the materialized template,
    /// relative to the build directory (empty = the build directory itself)
    pub template_root: PathBuf,

    pub toolchain: ToolchainSettings,
    pub patch: PatchSettings,
    pub signing: SigningSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            builds_root: PathBuf::from("builds"),
            template: TemplateSource::Archive(PathBuf::from("../webview-template-main.zip")),
            template_root: PathBuf::from("webview-template-main"),
            toolchain: ToolchainSettings::default(),
            patch: PatchSettings::default(),
            signing: SigningSettings::default(),
        }
    }
}

/// How external commands are located and bounded
#[derive(Debug, Clone)]
pub struct ToolchainSettings {
    pub flutter_bin: String,
    pub keytool_bin: String,

    /// Upper bound for every command except the release build
    pub command_timeout: Duration,

    /// Upper bound for the release build
    pub build_timeout: Duration,

    /// Extra environment merged over the inherited process environment
    pub env: HashMap<String, String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            flutter_bin: "flutter".to_string(),
            keytool_bin: "keytool".to_string(),
            command_timeout: Duration::from_secs(600), // 10 minutes
            build_timeout: Duration::from_secs(1800),  // 30 minutes
            env: HashMap::new(),
        }
    }
}

/// Edits applied to the template after materialization
///
/// All paths are relative to the project directory.
#[derive(Debug, Clone)]
pub struct PatchSettings {
    /// Application configuration file holding the URL placeholder
    pub app_config_file: PathBuf,
    pub url_placeholder: String,

    /// Gradle wrapper properties whose distribution gets pinned
    pub wrapper_properties: PathBuf,
    pub gradle_version: String,

    /// Gradle properties receiving the resource limits
    pub gradle_properties: PathBuf,
    pub gradle_max_workers: u32,
    pub gradle_max_heap: String,

    /// Destination of the downloaded launcher icon
    pub icon_path: PathBuf,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            app_config_file: PathBuf::from(".env"),
            url_placeholder: "APP_URL_PLACEHOLDER".to_string(),
            wrapper_properties: PathBuf::from("android/gradle/wrapper/gradle-wrapper.properties"),
            gradle_version: "8.4".to_string(),
            gradle_properties: PathBuf::from("android/gradle.properties"),
            gradle_max_workers: 2,
            gradle_max_heap: "1536m".to_string(),
            icon_path: PathBuf::from("assets/icons/logo.png"),
        }
    }
}

/// Throwaway signing identity generated for each build
#[derive(Debug, Clone)]
pub struct SigningSettings {
    /// Keystore location, relative to the project directory
    pub keystore_path: PathBuf,
    /// Properties file read by the Gradle signing config
    pub key_properties_path: PathBuf,
    pub key_alias: String,
    pub password: String,
    pub validity_days: u32,
    pub distinguished_name: String,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            keystore_path: PathBuf::from("android/app/upload-keystore.jks"),
            key_properties_path: PathBuf::from("android/key.properties"),
            key_alias: "upload".to_string(),
            password: "android".to_string(),
            validity_days: 10000,
            distinguished_name:
                "CN=apkforge, OU=Development, O=apkforge, L=City, S=State, C=US".to_string(),
        }
    }
}
