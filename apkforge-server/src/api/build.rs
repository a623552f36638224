//! Build API Handlers
//!
//! HTTP endpoints for starting builds, checking their status and
//! downloading artifacts.

use apkforge_core::dto::build::{
    BuildAccepted, BuildCompleted, BuildFailed, BuildList, BuildStatusResponse, CreateBuild,
    MissingFields,
};
use axum::{
    Json,
    extract::{Path, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::service::BuildService;

#[derive(Debug, Default, Deserialize)]
pub struct BuildQuery {
    /// Return immediately and build in the background
    #[serde(default)]
    pub detach: bool,
}

/// POST /build
/// Validate a request and run its build
pub async fn create_build(
    State(service): State<Arc<BuildService>>,
    Query(query): Query<BuildQuery>,
    body: Result<Json<CreateBuild>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let params = req.validate().map_err(|e| {
        tracing::warn!("Rejected build request: {}", e);
        ApiError::MissingFields(MissingFields::from(e))
    })?;

    let build_id = Uuid::new_v4();
    tracing::info!(
        "Build {} requested for '{}' ({})",
        build_id,
        params.app_name,
        params.package_id
    );

    if query.detach {
        service.spawn(build_id, params);
        let accepted = BuildAccepted {
            success: true,
            build_id,
            status_url: format!("/build-status/{}", build_id),
        };
        return Ok((StatusCode::ACCEPTED, Json(accepted)).into_response());
    }

    match service.run(build_id, params.clone()).await {
        Ok(Ok(outcome)) => {
            let completed = BuildCompleted {
                success: true,
                build_id,
                message: "APK built successfully".to_string(),
                download_url: service.download_url(build_id, &outcome.artifact_name),
                artifact_path: outcome.artifact_path.display().to_string(),
                params,
            };
            Ok(Json(completed).into_response())
        }
        Ok(Err(failure)) => Err(ApiError::BuildFailed(BuildFailed {
            error: "Build failed".to_string(),
            message: failure.error.to_string(),
            build_id: failure.build_id,
        })),
        Err(e) => Err(ApiError::InternalError(format!("{:#}", e))),
    }
}

fn parse_build_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Build not found".to_string()))
}

/// GET /build-status/{id}
pub async fn get_build_status(
    State(service): State<Arc<BuildService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BuildStatusResponse>> {
    let build_id = parse_build_id(&id)?;
    tracing::debug!("Getting status of build: {}", build_id);

    let status = service.status(build_id).await?;
    let state = status
        .state()
        .ok_or_else(|| ApiError::NotFound("Build not found".to_string()))?;

    Ok(Json(BuildStatusResponse {
        status: state,
        build_id,
        download_url: status
            .artifact_name()
            .map(|name| service.download_url(build_id, name)),
    }))
}

/// GET /builds
/// List all builds, newest first
pub async fn list_builds(State(service): State<Arc<BuildService>>) -> ApiResult<Json<BuildList>> {
    tracing::debug!("Listing builds");

    let builds = service.list().await?;
    Ok(Json(BuildList { builds }))
}

/// GET /builds/{id}/{file}
/// Download a published artifact
pub async fn download_artifact(
    State(service): State<Arc<BuildService>>,
    Path((id, file)): Path<(String, String)>,
    request: Request,
) -> ApiResult<Response> {
    let build_id = parse_build_id(&id)?;
    let path = service
        .artifact_file(build_id, &file)
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    Ok(response.into_response())
}
