use super::*;
use crate::exporter::test_helpers::{CountingWriter, FakeRowSource, test_config};
use crate::writer::XlsxWriter;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

mod export;

/// Build a router over a service fed by a fake source
async fn test_app(total_rows: u64) -> (Router, Arc<ExportService>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let service = Arc::new(
        ExportService::new(
            config.clone(),
            Arc::new(FakeRowSource { total: total_rows }),
            Arc::new(XlsxWriter::new()),
        )
        .await
        .unwrap(),
    );
    let app = create_router(Arc::clone(&service), Arc::new(config));
    (app, service, dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _service, _dir) = test_app(10).await;

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["code"], 200);
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (app, _service, _dir) = test_app(10).await;

    let response = app.oneshot(get_request("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(json["info"]["title"], "excel-export REST API");
    assert!(
        json["paths"]
            .as_object()
            .unwrap()
            .contains_key("/api/v1/export/start")
    );
}

#[tokio::test]
async fn test_memory_monitor_endpoint() {
    let (app, _service, _dir) = test_app(10).await;

    let response = app.oneshot(get_request("/monitor/memory")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["data"]["total_bytes"].as_u64().unwrap() > 0);
    let ratio = json["data"]["usage_ratio"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&ratio));
    assert!(json["data"]["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (app, _service, _dir) = test_app(10).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.api.swagger_ui = false;

    let (counting, _) = CountingWriter::new();
    let service = Arc::new(
        ExportService::new(
            config.clone(),
            Arc::new(FakeRowSource { total: 10 }),
            Arc::new(counting),
        )
        .await
        .unwrap(),
    );
    let app = create_router(service, Arc::new(config));

    let response = app.oneshot(get_request("/swagger-ui/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
