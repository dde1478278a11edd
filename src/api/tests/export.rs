//! Route tests for the export task endpoints and artifact download.

use super::*;
use crate::types::TaskId;
use axum::http::header;
use serde_json::json;

#[tokio::test]
async fn test_start_export_sync_completes() {
    let (app, _service, _dir) = test_app(35).await;

    let request = post_json(
        "/export/start",
        json!({
            "export_type": "employee",
            "task_name": "api sync export",
            "async": false
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["status"], "SUCCESS");
    assert_eq!(body["data"]["total_count"], 35);
    assert_eq!(body["data"]["processed_count"], 35);
    assert!(
        body["data"]["download_url"]
            .as_str()
            .unwrap()
            .starts_with("/api/v1/export/download/")
    );
}

#[tokio::test]
async fn test_start_export_async_returns_pending_snapshot() {
    let (app, service, _dir) = test_app(35).await;

    let request = post_json("/export/start", json!({ "export_type": "employee" }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let task_id = TaskId::from(body["data"]["task_id"].as_str().unwrap());

    // Poll the service until the spawned export reaches a terminal state
    let mut status = body["data"]["status"].as_str().unwrap().to_string();
    for _ in 0..100 {
        let snapshot = service.get_status(&task_id).await.unwrap();
        status = snapshot.status.as_str().to_string();
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(status, "SUCCESS");
}

#[tokio::test]
async fn test_start_export_rejects_blank_export_type() {
    let (app, _service, _dir) = test_app(10).await;

    let request = post_json("/export/start", json!({ "export_type": "   " }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_start_export_empty_result_set() {
    let (app, _service, _dir) = test_app(0).await;

    let request = post_json("/export/start", json!({ "export_type": "employee" }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "no_data");
}

#[tokio::test]
async fn test_get_status_unknown_task() {
    let (app, _service, _dir) = test_app(10).await;

    let response = app
        .oneshot(get_request("/export/status/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_get_status_known_task() {
    let (app, _service, _dir) = test_app(15).await;

    let request = post_json(
        "/export/start",
        json!({ "export_type": "employee", "async": false }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/export/status/{task_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["task_id"], task_id);
    assert_eq!(body["data"]["status"], "SUCCESS");
}

#[tokio::test]
async fn test_list_tasks_returns_submitted_tasks() {
    let (app, _service, _dir) = test_app(15).await;

    let request = post_json(
        "/export/start",
        json!({
            "export_type": "employee",
            "created_by": "alice",
            "async": false
        }),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app
        .oneshot(get_request("/export/tasks?created_by=alice&limit=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["created_by"], "alice");
}

#[tokio::test]
async fn test_list_tasks_defaults_to_configured_creator() {
    let (app, _service, _dir) = test_app(15).await;

    let request = post_json(
        "/export/start",
        json!({ "export_type": "employee", "async": false }),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app.oneshot(get_request("/export/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["created_by"], "system");
}

#[tokio::test]
async fn test_get_statistics() {
    let (app, _service, _dir) = test_app(10).await;

    let response = app.oneshot(get_request("/export/statistics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["processing_count"], 0);
    assert!(body["data"]["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_get_file_info_for_completed_task() {
    let (app, _service, _dir) = test_app(15).await;

    let request = post_json(
        "/export/start",
        json!({ "export_type": "employee", "async": false }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/export/file-info/{task_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["downloadable"], true);
    assert!(
        body["data"]["file_name"]
            .as_str()
            .unwrap()
            .ends_with(".xlsx")
    );
}

#[tokio::test]
async fn test_download_completed_artifact() {
    let (app, _service, _dir) = test_app(15).await;

    let request = post_json(
        "/export/start",
        json!({ "export_type": "employee", "async": false }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/export/download/{task_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename*=UTF-8''"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn test_download_unknown_task() {
    let (app, _service, _dir) = test_app(10).await;

    let response = app
        .oneshot(get_request("/export/download/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}
