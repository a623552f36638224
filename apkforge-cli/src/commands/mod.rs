//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod build;
mod health;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build an application package
    Build {
        /// Display name of the application
        #[arg(long)]
        name: Option<String>,

        /// URL the application opens
        #[arg(long)]
        url: Option<String>,

        /// URL of the launcher icon
        #[arg(long)]
        logo: Option<String>,

        /// Android application id (e.g. com.example.app)
        #[arg(long)]
        package: Option<String>,

        /// Return immediately and let the server build in the background
        #[arg(long, conflicts_with = "output")]
        detach: bool,

        /// Download the finished package to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the status of a build
    Status {
        /// Build ID or unambiguous prefix
        id: String,
    },
    /// List all builds
    List,
    /// Download the package of a completed build
    Download {
        /// Build ID or unambiguous prefix
        id: String,

        /// Destination path (defaults to the artifact name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that the server is up
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Build {
            name,
            url,
            logo,
            package,
            detach,
            output,
        } => {
            let request = apkforge_core::dto::build::CreateBuild {
                app_name: name,
                app_url: url,
                logo_url: logo,
                package_id: package,
            };
            build::create_build(config, request, detach, output).await
        }
        Commands::Status { id } => build::show_status(config, &id).await,
        Commands::List => build::list_builds(config).await,
        Commands::Download { id, output } => build::download(config, &id, output).await,
        Commands::Health => health::check(config).await,
    }
}
