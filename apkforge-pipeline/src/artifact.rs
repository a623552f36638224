//! Artifact location and publication

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::{BuildError, Result};

/// Suffix identifying a published artifact
pub const ARTIFACT_SUFFIX: &str = "-release.apk";

/// Where the toolchain leaves the release package, relative to the project
pub const TOOLCHAIN_OUTPUT: &str = "build/app/outputs/flutter-apk/app-release.apk";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// Turns a display name into a file name stem
///
/// Whitespace runs become a single `_`, then any character outside
/// `[A-Za-z0-9._-]` becomes `_`. The result never contains a path
/// separator.
pub fn sanitize_app_name(app_name: &str) -> String {
    let collapsed = WHITESPACE.replace_all(app_name.trim(), "_");
    let safe = UNSAFE_CHARS.replace_all(&collapsed, "_");
    match safe.trim_matches('.') {
        "" => "app".to_string(),
        stem => stem.to_string(),
    }
}

pub fn artifact_file_name(app_name: &str) -> String {
    format!("{}{}", sanitize_app_name(app_name), ARTIFACT_SUFFIX)
}

pub fn is_artifact_name(name: &str) -> bool {
    name.ends_with(ARTIFACT_SUFFIX)
}

/// Copies the toolchain output into the build directory
///
/// The copy is written under a temporary name and renamed once synced, so
/// an artifact name only ever refers to a complete file. The toolchain
/// output stays in place. Returns the published path.
pub async fn publish_artifact(
    project_dir: &Path,
    build_dir: &Path,
    app_name: &str,
) -> Result<PathBuf> {
    let output = project_dir.join(TOOLCHAIN_OUTPUT);
    let is_file = tokio::fs::metadata(&output)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(BuildError::ArtifactNotFound { path: output });
    }

    let file_name = artifact_file_name(app_name);
    let published = build_dir.join(&file_name);
    let partial = build_dir.join(partial_name(&file_name));

    let bytes = match copy_synced(&output, &partial).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(BuildError::workspace(&partial, e));
        }
    };
    tokio::fs::rename(&partial, &published)
        .await
        .map_err(|e| BuildError::workspace(&published, e))?;

    info!(
        "Published artifact {} ({} bytes)",
        published.display(),
        bytes
    );
    Ok(published)
}

/// Name an artifact is written under before it is complete
fn partial_name(file_name: &str) -> String {
    format!(".{}.part", file_name)
}

async fn copy_synced(from: &Path, to: &Path) -> std::io::Result<u64> {
    let bytes = tokio::fs::copy(from, to).await?;
    tokio::fs::File::open(to).await?.sync_all().await?;
    Ok(bytes)
}
