//! Template configuration edits
//!
//! Textual edits applied to files of the materialized template: the URL
//! placeholder, the Gradle distribution pin and the Gradle resource limits.
//! The pure text transforms are separate from the file handling so they
//! can be checked in isolation.

use regex::Regex;
use std::io;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::config::PatchSettings;
use crate::error::{BuildError, Result};

static GRADLE_DISTRIBUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"gradle-\d+(?:\.\d+)*(?:-(?:rc|milestone)-\d+)?-(all|bin)\.zip").unwrap()
});

/// Replaces every literal occurrence of `token` with `value`
///
/// Returns the new text and the number of replacements. All other bytes
/// are left untouched.
pub fn replace_placeholder(text: &str, token: &str, value: &str) -> (String, usize) {
    if token.is_empty() {
        return (text.to_string(), 0);
    }
    let count = text.matches(token).count();
    (text.replace(token, value), count)
}

/// Points every Gradle distribution reference at `version`
///
/// Keeps the `-all` / `-bin` flavor of each reference. Returns the new
/// text and the number of rewritten references.
pub fn pin_gradle_distribution(text: &str, version: &str) -> (String, usize) {
    let count = GRADLE_DISTRIBUTION.find_iter(text).count();
    let pinned = GRADLE_DISTRIBUTION.replace_all(text, |caps: &regex::Captures<'_>| {
        format!("gradle-{}-{}.zip", version, &caps[1])
    });
    (pinned.into_owned(), count)
}

/// Gradle settings keeping the build inside a small memory budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_workers: u32,
    pub max_heap: String,
}

impl ResourceLimits {
    /// Properties appended to `gradle.properties`
    ///
    /// Java properties resolve duplicate keys to the last value, so the
    /// appended block overrides whatever the template set earlier.
    pub fn properties(&self) -> String {
        format!(
            "# apkforge resource limits\n\
             org.gradle.daemon=false\n\
             org.gradle.parallel=false\n\
             org.gradle.workers.max={}\n\
             org.gradle.jvmargs=-Xmx{} -XX:MaxMetaspaceSize=512m -Dfile.encoding=UTF-8\n\
             kotlin.compiler.execution.strategy=in-process\n",
            self.max_workers, self.max_heap
        )
    }
}

/// Appends the limits to existing properties text
pub fn append_resource_limits(existing: &str, limits: &ResourceLimits) -> String {
    let mut text = existing.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&limits.properties());
    text
}

async fn read_required(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BuildError::patch(path, e))
}

async fn write(path: &Path, text: &str) -> Result<()> {
    tokio::fs::write(path, text)
        .await
        .map_err(|e| BuildError::patch(path, e))
}

/// Applies the configured edits to a project directory
pub struct ConfigPatcher<'a> {
    settings: &'a PatchSettings,
}

impl<'a> ConfigPatcher<'a> {
    pub fn new(settings: &'a PatchSettings) -> Self {
        Self { settings }
    }

    /// Substitutes the application URL into the app configuration file
    pub async fn patch_app_url(&self, project_dir: &Path, app_url: &str) -> Result<usize> {
        let path = project_dir.join(&self.settings.app_config_file);
        let text = read_required(&path).await?;

        let (patched, count) = replace_placeholder(&text, &self.settings.url_placeholder, app_url);
        if count == 0 {
            warn!(
                "Placeholder {} not found in {}",
                self.settings.url_placeholder,
                path.display()
            );
        }

        write(&path, &patched).await?;
        Ok(count)
    }

    /// Pins the Gradle wrapper distribution
    pub async fn pin_gradle_wrapper(&self, project_dir: &Path) -> Result<usize> {
        let path = project_dir.join(&self.settings.wrapper_properties);
        let text = read_required(&path).await?;

        let (patched, count) = pin_gradle_distribution(&text, &self.settings.gradle_version);
        if count == 0 {
            warn!("No Gradle distribution reference in {}", path.display());
        }

        write(&path, &patched).await?;
        Ok(count)
    }

    /// Appends the resource limits, creating the properties file if absent
    pub async fn apply_resource_limits(&self, project_dir: &Path) -> Result<()> {
        let path = project_dir.join(&self.settings.gradle_properties);
        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(BuildError::patch(&path, e)),
        };

        let limits = ResourceLimits {
            max_workers: self.settings.gradle_max_workers,
            max_heap: self.settings.gradle_max_heap.clone(),
        };
        write(&path, &append_resource_limits(&existing, &limits)).await
    }

    /// Runs all edits in order and summarizes them
    pub async fn apply(&self, project_dir: &Path, app_url: &str) -> Result<String> {
        let urls = self.patch_app_url(project_dir, app_url).await?;
        let pins = self.pin_gradle_wrapper(project_dir).await?;
        self.apply_resource_limits(project_dir).await?;

        info!(
            "Patched template: {} URL placeholder(s), {} Gradle reference(s)",
            urls, pins
        );
        Ok(format!(
            "Replaced {} URL placeholder(s), pinned {} Gradle reference(s) to {}, applied resource limits",
            urls, pins, self.settings.gradle_version
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_replace_placeholder_replaces_every_occurrence() {
        let text = "APP_URL=APP_URL_PLACEHOLDER\n# fallback: APP_URL_PLACEHOLDER\nOTHER=1\n";
        let (patched, count) =
            replace_placeholder(text, "APP_URL_PLACEHOLDER", "https://example.com");

        assert_eq!(count, 2);
        assert_eq!(
            patched,
            "APP_URL=https://example.com\n# fallback: https://example.com\nOTHER=1\n"
        );
    }

    #[test]
    fn test_replace_placeholder_leaves_other_content_identical() {
        let text = "no placeholder here\r\n\tkeep  spacing\u{00e9}\n";
        let (patched, count) = replace_placeholder(text, "APP_URL_PLACEHOLDER", "x");
        assert_eq!(count, 0);
        assert_eq!(patched, text);
    }

    #[test]
    fn test_replace_placeholder_value_is_literal() {
        // Replacement values are not interpreted
        let (patched, _) = replace_placeholder("a=TOKEN", "TOKEN", "$1 ${x} \\n");
        assert_eq!(patched, "a=$1 ${x} \\n");
    }

    #[test]
    fn test_pin_gradle_distribution_variants() {
        let all = "distributionUrl=https\\://services.gradle.org/distributions/gradle-8.3-all.zip\n";
        let (patched, count) = pin_gradle_distribution(all, "8.4");
        assert_eq!(count, 1);
        assert_eq!(
            patched,
            "distributionUrl=https\\://services.gradle.org/distributions/gradle-8.4-all.zip\n"
        );

        let bin = "distributionUrl=https\\://services.gradle.org/distributions/gradle-7.6.1-bin.zip";
        let (patched, _) = pin_gradle_distribution(bin, "8.4");
        assert!(patched.ends_with("gradle-8.4-bin.zip"));

        let rc = "distributionUrl=https\\://x/gradle-8.5-rc-2-all.zip";
        let (patched, _) = pin_gradle_distribution(rc, "8.4");
        assert!(patched.ends_with("gradle-8.4-all.zip"));
    }

    #[test]
    fn test_pin_gradle_distribution_no_reference() {
        let text = "distributionBase=GRADLE_USER_HOME\n";
        assert_eq!(pin_gradle_distribution(text, "8.4"), (text.to_string(), 0));
    }

    #[test]
    fn test_append_resource_limits() {
        let limits = ResourceLimits {
            max_workers: 2,
            max_heap: "1536m".to_string(),
        };

        let created = append_resource_limits("", &limits);
        assert!(created.starts_with("# apkforge resource limits\n"));
        assert!(created.contains("org.gradle.daemon=false\n"));
        assert!(created.contains("org.gradle.workers.max=2\n"));
        assert!(created.contains("-Xmx1536m"));

        let appended = append_resource_limits("android.useAndroidX=true", &limits);
        assert!(appended.starts_with("android.useAndroidX=true\n# apkforge"));
    }

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("android/gradle/wrapper")).unwrap();
        fs::write(root.join(".env"), "APP_URL=APP_URL_PLACEHOLDER\n").unwrap();
        fs::write(
            root.join("android/gradle/wrapper/gradle-wrapper.properties"),
            "distributionUrl=https\\://services.gradle.org/distributions/gradle-8.3-all.zip\n",
        )
        .unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_apply_patches_project() {
        let tmp = project();
        let settings = PatchSettings::default();

        let summary = ConfigPatcher::new(&settings)
            .apply(tmp.path(), "https://example.com")
            .await
            .unwrap();

        assert!(summary.contains("1 URL placeholder"));
        assert_eq!(
            fs::read_to_string(tmp.path().join(".env")).unwrap(),
            "APP_URL=https://example.com\n"
        );
        assert!(
            fs::read_to_string(tmp.path().join("android/gradle/wrapper/gradle-wrapper.properties"))
                .unwrap()
                .contains("gradle-8.4-all.zip")
        );
        assert!(
            fs::read_to_string(tmp.path().join("android/gradle.properties"))
                .unwrap()
                .contains("org.gradle.daemon=false")
        );
    }

    #[tokio::test]
    async fn test_apply_fails_without_app_config() {
        let tmp = project();
        fs::remove_file(tmp.path().join(".env")).unwrap();
        let settings = PatchSettings::default();

        let err = ConfigPatcher::new(&settings)
            .apply(tmp.path(), "https://example.com")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "PatchError");
    }

    #[tokio::test]
    async fn test_apply_fails_without_wrapper_properties() {
        let tmp = project();
        fs::remove_file(tmp.path().join("android/gradle/wrapper/gradle-wrapper.properties"))
            .unwrap();
        let settings = PatchSettings::default();

        let err = ConfigPatcher::new(&settings)
            .pin_gradle_wrapper(tmp.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "PatchError");
    }
}
