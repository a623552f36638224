//! Health command handler

use anyhow::{Context, Result};
use apkforge_client::ApkforgeClient;
use colored::*;

use crate::config::Config;

pub async fn check(config: &Config) -> Result<()> {
    let client = ApkforgeClient::new(&config.server_url);

    let health = client
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", config.server_url))?;

    println!(
        "{} {} is {} (version {})",
        "✓".green(),
        client.base_url(),
        health.status.green(),
        health.version
    );
    println!(
        "  Server time: {}",
        health
            .timestamp
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );

    Ok(())
}
