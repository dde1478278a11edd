//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the excel-export REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the excel-export REST API
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "excel-export REST API",
        version = "0.1.0",
        description = "REST API for submitting spreadsheet export tasks, tracking their progress, and downloading the finished artifacts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development server")
    ),
    paths(
        // Export tasks
        crate::api::routes::start_export,
        crate::api::routes::get_status,
        crate::api::routes::list_tasks,
        crate::api::routes::get_statistics,
        crate::api::routes::get_file_info,

        // Downloads
        crate::api::routes::download_artifact,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_memory_status,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::TaskSnapshot,
        crate::types::ExportRequest,
        crate::types::ExportFilter,
        crate::types::ExportStatistics,
        crate::types::FileInfo,
        crate::types::MemoryStatus,

        // Config types from config.rs
        crate::config::Config,
        crate::config::ExportConfig,
        crate::config::CacheConfig,
        crate::config::SamplerConfig,
        crate::config::PersistenceConfig,
        crate::config::ApiConfig,

        // Response envelopes from routes
        crate::api::routes::TaskSnapshotResponse,
        crate::api::routes::TaskListResponse,
        crate::api::routes::StatisticsResponse,
        crate::api::routes::FileInfoResponse,
        crate::api::routes::MemoryStatusResponse,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "export", description = "Export tasks - Submit exports, track progress, list tasks"),
        (name = "download", description = "Downloads - Stream finished artifacts"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
