//! API Module
//!
//! HTTP API layer for the build server.
//! Each submodule handles endpoints for a specific domain.

pub mod build;
pub mod error;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::BuildService;

/// Create the main API router with all endpoints
pub fn create_router(service: Arc<BuildService>) -> Router {
    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health_check))
        // Build endpoints
        .route("/build", post(build::create_build))
        .route("/build-status/{id}", get(build::get_build_status))
        .route("/builds", get(build::list_builds))
        .route("/builds/{id}/{file}", get(build::download_artifact))
        // Add state and middleware
        .with_state(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
