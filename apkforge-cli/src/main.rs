//! apkforge CLI
//!
//! Command-line interface for the apkforge build server.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "apkforge")]
#[command(about = "Build Android packages from a web app template", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "APKFORGE_SERVER_URL", default_value = "http://localhost:3000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_command() {
        let cli = Cli::try_parse_from([
            "apkforge",
            "--server-url",
            "http://build.local:3000",
            "build",
            "--name",
            "Demo App",
            "--url",
            "https://example.com",
            "--logo",
            "https://example.com/icon.png",
            "--package",
            "com.example.demo",
            "--detach",
        ])
        .unwrap();

        assert_eq!(cli.server_url, "http://build.local:3000");
        match cli.command {
            Commands::Build {
                name,
                package,
                detach,
                output,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("Demo App"));
                assert_eq!(package.as_deref(), Some("com.example.demo"));
                assert!(detach);
                assert!(output.is_none());
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_parse_status_command() {
        let cli = Cli::try_parse_from(["apkforge", "status", "6f1c2a52"]).unwrap();
        assert!(matches!(cli.command, Commands::Status { id } if id == "6f1c2a52"));
    }

    #[test]
    fn test_status_requires_id() {
        assert!(Cli::try_parse_from(["apkforge", "status"]).is_err());
    }
}
