use anyhow::Context;
use apkforge_pipeline::{HttpAssetFetcher, Pipeline, ProcessToolchain};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;

#[cfg(test)]
mod testing;

use config::Config;
use service::BuildService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "apkforge_server=info,apkforge_pipeline=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting apkforge server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Builds root: {}, template: {:?}, max concurrent builds: {}",
        config.pipeline.builds_root.display(),
        config.pipeline.template,
        config.max_concurrent_builds
    );

    tokio::fs::create_dir_all(&config.pipeline.builds_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create builds root {}",
                config.pipeline.builds_root.display()
            )
        })?;

    let pipeline = Pipeline::new(
        config.pipeline.clone(),
        Arc::new(ProcessToolchain::new()),
        Arc::new(HttpAssetFetcher::new()),
    );
    let addr = config.bind_addr.clone();
    let service = Arc::new(BuildService::new(config, pipeline));

    // Build router with all API endpoints
    let app = api::create_router(service);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
