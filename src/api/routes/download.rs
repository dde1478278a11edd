//! Artifact download handler.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

use crate::api::AppState;
use crate::types::TaskId;
use crate::Error;

/// GET /export/download/:task_id - Stream a completed export's artifact
#[utoipa::path(
    get,
    path = "/api/v1/export/download/{task_id}",
    tag = "download",
    params(
        ("task_id" = String, Path, description = "Export task ID")
    ),
    responses(
        (status = 200, description = "The artifact as an attachment", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 404, description = "Task or artifact not found", body = crate::error::ApiError),
        (status = 409, description = "Task has not completed", body = crate::error::ApiError)
    )
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, Error> {
    let artifact = state
        .service
        .resolve_download(&TaskId::from(task_id))
        .await?;

    let file = tokio::fs::File::open(&artifact.path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    // RFC 5987 filename* so non-ASCII artifact names survive the header
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&artifact.file_name)
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.content_type)
        .header(header::CONTENT_LENGTH, artifact.file_size)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(body)
        .map_err(|e| Error::ApiServerError(e.to_string()))
}
