//! Health and index handlers

use apkforge_core::dto::health::{ApiIndex, Health};
use axum::Json;
use chrono::Utc;
use std::collections::BTreeMap;

/// GET /health
pub async fn health_check() -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /
/// Lists the available endpoints
pub async fn index() -> Json<ApiIndex> {
    let endpoints = [
        ("build", "POST /build"),
        ("status", "GET /build-status/{buildId}"),
        ("builds", "GET /builds"),
        ("download", "GET /builds/{buildId}/{file}"),
        ("health", "GET /health"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect::<BTreeMap<_, _>>();

    Json(ApiIndex {
        message: "apkforge build server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}
