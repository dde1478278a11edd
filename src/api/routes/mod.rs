//! API route handlers
//!
//! Handlers are thin plumbing over [`crate::ExportService`]: extract, call,
//! wrap in the response envelope. Errors convert through
//! [`crate::error::ToHttpStatus`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod download;
mod export;
mod system;

pub use download::*;
pub use export::*;
pub use system::*;

/// Response envelope wrapping every successful payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    TaskSnapshotResponse = ApiResponse<crate::types::TaskSnapshot>,
    TaskListResponse = ApiResponse<Vec<crate::types::TaskSnapshot>>,
    StatisticsResponse = ApiResponse<crate::types::ExportStatistics>,
    FileInfoResponse = ApiResponse<crate::types::FileInfo>,
    MemoryStatusResponse = ApiResponse<crate::types::MemoryStatus>,
    HealthResponse = ApiResponse<serde_json::Value>
)]
pub struct ApiResponse<T> {
    /// Status code mirroring the HTTP status
    pub code: i32,

    /// Short outcome description
    pub message: String,

    /// The payload, absent on errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Unix timestamp (milliseconds) when the response was built
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    /// Wrap a successful payload
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
