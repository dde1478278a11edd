//! System handlers: health check, OpenAPI spec.

use axum::{Json, extract::State};
use serde_json::json;
use utoipa::OpenApi;

use crate::api::{ApiDoc, AppState};

use super::ApiResponse;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(_state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(json!({ "status": "ok" })))
}

/// GET /monitor/memory - Live process and host memory reading
#[utoipa::path(
    get,
    path = "/api/v1/monitor/memory",
    tag = "system",
    responses(
        (status = 200, description = "Current memory usage", body = MemoryStatusResponse)
    )
)]
pub async fn get_memory_status(
    State(_state): State<AppState>,
) -> Json<ApiResponse<crate::types::MemoryStatus>> {
    Json(ApiResponse::success(crate::sampler::memory_status()))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification document")
    )
)]
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
