//! Export task handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::AppState;
use crate::types::{ExportRequest, TaskId};
use crate::Error;

use super::ApiResponse;

/// Query parameters for listing export tasks
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListTasksQuery {
    /// Creator identity to list tasks for (defaults to the configured creator)
    pub created_by: Option<String>,

    /// Maximum number of tasks to return
    pub limit: Option<i64>,
}

/// POST /export/start - Submit a new export task
#[utoipa::path(
    post,
    path = "/api/v1/export/start",
    tag = "export",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Export task accepted", body = TaskSnapshotResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 422, description = "Filter matches no rows", body = crate::error::ApiError),
        (status = 429, description = "Too many exports in progress", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ApiResponse<crate::types::TaskSnapshot>>, Error> {
    let snapshot = state.service.submit(request).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// GET /export/status/:task_id - Get a task's current snapshot
#[utoipa::path(
    get,
    path = "/api/v1/export/status/{task_id}",
    tag = "export",
    params(
        ("task_id" = String, Path, description = "Export task ID")
    ),
    responses(
        (status = 200, description = "Task snapshot", body = TaskSnapshotResponse),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<crate::types::TaskSnapshot>>, Error> {
    let snapshot = state.service.get_status(&TaskId::from(task_id)).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// GET /export/tasks - List a creator's tasks, most recent first
#[utoipa::path(
    get,
    path = "/api/v1/export/tasks",
    tag = "export",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Task list", body = TaskListResponse)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<ApiResponse<Vec<crate::types::TaskSnapshot>>>, Error> {
    let tasks = state
        .service
        .list_tasks(query.created_by.as_deref(), query.limit.unwrap_or(10))
        .await?;
    Ok(Json(ApiResponse::success(tasks)))
}

/// GET /export/statistics - Export subsystem statistics
#[utoipa::path(
    get,
    path = "/api/v1/export/statistics",
    tag = "export",
    responses(
        (status = 200, description = "Statistics", body = StatisticsResponse)
    )
)]
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<crate::types::ExportStatistics>>, Error> {
    let statistics = state.service.statistics().await?;
    Ok(Json(ApiResponse::success(statistics)))
}

/// GET /export/file-info/:task_id - Artifact information for a task
#[utoipa::path(
    get,
    path = "/api/v1/export/file-info/{task_id}",
    tag = "export",
    params(
        ("task_id" = String, Path, description = "Export task ID")
    ),
    responses(
        (status = 200, description = "Artifact information", body = FileInfoResponse),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_file_info(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<crate::types::FileInfo>>, Error> {
    let info = state.service.file_info(&TaskId::from(task_id)).await?;
    Ok(Json(ApiResponse::success(info)))
}
