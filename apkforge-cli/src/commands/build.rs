//! Build command handlers
//!
//! Handles starting builds, following their status, listing them and
//! downloading finished packages.

use anyhow::{Context, Result, bail};
use apkforge_client::ApkforgeClient;
use apkforge_core::domain::build::BuildState;
use apkforge_core::dto::build::{BuildStatusResponse, BuildSummary, CreateBuild};
use colored::*;
use std::path::PathBuf;

use crate::config::Config;
use crate::id_resolver::resolve_build_id;

/// Start a build, wait for it unless detached, and optionally download it
pub async fn create_build(
    config: &Config,
    request: CreateBuild,
    detach: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = ApkforgeClient::new(&config.server_url);

    if detach {
        let accepted = client
            .build_detached(request)
            .await
            .context("Failed to start build")?;
        println!("{} Build started", "✓".green());
        println!("  Build ID: {}", accepted.build_id.to_string().cyan());
        println!("  Status:   {}", client.resolve(&accepted.status_url).dimmed());
        return Ok(());
    }

    println!("{}", "Building... this can take several minutes.".dimmed());
    let completed = match client.build(request).await {
        Ok(completed) => completed,
        Err(e) => {
            if let Some(build_id) = e.build_id() {
                eprintln!("{} Build {} failed", "✗".red(), build_id.to_string().dimmed());
            }
            return Err(e).context("Build failed");
        }
    };

    println!("{} {}", "✓".green(), completed.message);
    println!("  Build ID: {}", completed.build_id.to_string().cyan());
    println!("  App:      {}", completed.params.app_name);
    println!("  Package:  {}", completed.params.package_id);
    println!("  Download: {}", client.resolve(&completed.download_url));

    if let Some(path) = output {
        let bytes = client
            .download(&completed.download_url, &path)
            .await
            .context("Failed to download package")?;
        println!("  Saved {} ({} bytes)", path.display(), bytes);
    }

    Ok(())
}

/// Show the status of one build
pub async fn show_status(config: &Config, id: &str) -> Result<()> {
    let client = ApkforgeClient::new(&config.server_url);
    let build_id = resolve_build_id(&client, id).await?;

    let status = client.build_status(build_id).await?;
    print_status(&client, &status);

    Ok(())
}

/// List all builds
pub async fn list_builds(config: &Config) -> Result<()> {
    let client = ApkforgeClient::new(&config.server_url);
    let builds = client.list_builds().await?.builds;

    if builds.is_empty() {
        println!("{}", "No builds found.".yellow());
    } else {
        println!("{}", format!("Found {} build(s):", builds.len()).bold());
        println!();
        for build in &builds {
            print_build_summary(&client, build);
        }
    }

    Ok(())
}

/// Download the package of a completed build
pub async fn download(config: &Config, id: &str, output: Option<PathBuf>) -> Result<()> {
    let client = ApkforgeClient::new(&config.server_url);
    let build_id = resolve_build_id(&client, id).await?;

    let status = client.build_status(build_id).await?;
    let Some(download_url) = status.download_url else {
        bail!("Build {} has not completed yet", build_id);
    };

    let path = match output {
        Some(path) => path,
        None => PathBuf::from(artifact_name(&download_url)),
    };

    let bytes = client.download(&download_url, &path).await?;
    println!(
        "{} Saved {} ({} bytes)",
        "✓".green(),
        path.display(),
        bytes
    );

    Ok(())
}

/// Last path segment of a download URL
fn artifact_name(download_url: &str) -> &str {
    download_url
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("app-release.apk")
}

fn print_status(client: &ApkforgeClient, status: &BuildStatusResponse) {
    println!("{}", "Build Details:".bold());
    println!("  ID:       {}", status.build_id.to_string().cyan());
    println!("  Status:   {}", colorize_state(status.status));
    if let Some(url) = &status.download_url {
        println!("  Download: {}", client.resolve(url));
    }
}

fn print_build_summary(client: &ApkforgeClient, build: &BuildSummary) {
    println!("  {} Build {}", "▸".cyan(), build.build_id.to_string().dimmed());
    println!("    Status:   {}", colorize_state(build.status));
    println!(
        "    Created:  {}",
        build
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(url) = &build.download_url {
        println!("    Download: {}", client.resolve(url));
    }
    println!();
}

/// Colorize build state for display
fn colorize_state(state: BuildState) -> ColoredString {
    let text = state.to_string();
    match state {
        BuildState::Building => text.yellow(),
        BuildState::Completed => text.green(),
    }
}
