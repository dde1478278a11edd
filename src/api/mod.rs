//! REST API server module
//!
//! Provides a REST API for submitting export tasks, tracking their progress,
//! and downloading the finished artifacts.

use crate::{Config, ExportService, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Export Tasks
/// - `POST /export/start` - Submit a new export task
/// - `GET /export/status/:task_id` - Get a task's current snapshot
/// - `GET /export/tasks` - List a creator's tasks
/// - `GET /export/statistics` - Export subsystem statistics
/// - `GET /export/file-info/:task_id` - Artifact information for a task
///
/// ## Downloads
/// - `GET /export/download/:task_id` - Stream a completed export's artifact
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /monitor/memory` - Live process and host memory reading
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(service: Arc<ExportService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    let router = Router::new()
        // Export tasks
        .route("/export/start", post(routes::start_export))
        .route("/export/status/:task_id", get(routes::get_status))
        .route("/export/tasks", get(routes::list_tasks))
        .route("/export/statistics", get(routes::get_statistics))
        .route("/export/file-info/:task_id", get(routes::get_file_info))
        // Downloads
        .route("/export/download/:task_id", get(routes::download_artifact))
        // System
        .route("/health", get(routes::health_check))
        .route("/monitor/memory", get(routes::get_memory_status))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state)
    // Note: SwaggerUi will use the existing /openapi.json endpoint we already defined
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api/v1/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    let cors = build_cors_layer(&config.api.cors_origins);
    router.layer(cors)
}

/// Build a CORS layer based on configured origins
///
/// Allows the specified origins ("*" or an empty list means any origin),
/// all methods, and all headers.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and serves
/// the API router until the server is shut down.
///
/// # Example
///
/// ```no_run
/// use excel_export::{Config, ExportService};
/// use excel_export::source::SqliteRowSource;
/// use excel_export::writer::XlsxWriter;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let source = Arc::new(SqliteRowSource::connect("./data/employees.db".as_ref()).await?);
/// let service = Arc::new(
///     ExportService::new(config.clone(), source, Arc::new(XlsxWriter::new())).await?,
/// );
///
/// // Start API server (blocks until shutdown)
/// excel_export::api::start_api_server(service, Arc::new(config)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(service: Arc<ExportService>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address.clone();

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, config);

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
