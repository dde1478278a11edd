//! Error types for excel-export
//!
//! This module provides the error taxonomy for the library, including:
//! - Submission-time errors (validation, capacity, no matching data)
//! - Execution errors raised by the batch loop
//! - Download state errors with one variant per violated precondition
//! - HTTP status code mapping for API integration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for excel-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for excel-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// Request failed validation (missing or empty required field)
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of the invalid input
        message: String,
        /// The request field that failed validation
        field: Option<String>,
    },

    /// Concurrency ceiling reached - too many exports currently processing
    #[error("too many export tasks in progress ({active} active, limit {limit}), try again later")]
    Capacity {
        /// Number of tasks currently in PROCESSING state
        active: i64,
        /// Configured concurrency ceiling
        limit: usize,
    },

    /// The filter matched zero rows at submission time
    #[error("no data matches the export filter")]
    NoData,

    /// Export task not found
    #[error("export task not found: {0}")]
    NotFound(String),

    /// Download requested for a task in the wrong state
    #[error("download error: {0}")]
    State(#[from] StateError),

    /// Failure inside the batch loop (data source, writer, or I/O fault)
    #[error("export failed: {0}")]
    Execution(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Spreadsheet writer error
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown in progress - not accepting new export tasks
    #[error("shutdown in progress: not accepting new export tasks")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Download state errors - one variant per violated precondition so the API
/// can report exactly which check failed.
#[derive(Debug, Error)]
pub enum StateError {
    /// Task exists but has not completed successfully
    #[error("task {task_id} is not completed (status: {status})")]
    NotCompleted {
        /// The task that was queried
        task_id: String,
        /// Its current status
        status: String,
    },

    /// Task completed but carries no artifact path
    #[error("task {task_id} has no artifact path recorded")]
    MissingPath {
        /// The task that was queried
        task_id: String,
    },

    /// Artifact path recorded but the file is gone or unreadable
    #[error("artifact for task {task_id} not found at {path}")]
    MissingFile {
        /// The task that was queried
        task_id: String,
        /// The recorded artifact path
        path: PathBuf,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs, with a machine-readable
/// error code and a human-readable message.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "export task not found: abc123"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message, suitable for displaying to end users
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::State(StateError::MissingFile { .. }) => 404,

            // 409 Conflict - resource in the wrong state for the operation
            Error::State(_) => 409,

            // 422 Unprocessable Entity - semantically empty request
            Error::NoData => 422,

            // 429 Too Many Requests - concurrency ceiling reached
            Error::Capacity { .. } => 429,

            // 500 Internal Server Error
            Error::Execution(_) => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Spreadsheet(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::Capacity { .. } => "capacity_exceeded",
            Error::NoData => "no_data",
            Error::NotFound(_) => "not_found",
            Error::State(e) => match e {
                StateError::NotCompleted { .. } => "not_completed",
                StateError::MissingPath { .. } => "missing_artifact_path",
                StateError::MissingFile { .. } => "missing_artifact",
            },
            Error::Execution(_) => "export_failed",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Spreadsheet(_) => "spreadsheet_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Capacity { active, limit } => Some(serde_json::json!({
                "active": active,
                "limit": limit,
            })),
            Error::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({
                "field": field,
            })),
            Error::State(StateError::NotCompleted { task_id, status }) => {
                Some(serde_json::json!({
                    "task_id": task_id,
                    "status": status,
                }))
            }
            _ => None,
        };

        match details {
            Some(d) => ApiError::with_details(code, message, d),
            None => ApiError::new(code, message),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Error::Spreadsheet(e.to_string())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_errors_map_to_client_status_codes() {
        let cases: Vec<(Error, u16, &str)> = vec![
            (
                Error::Validation {
                    message: "export type must not be empty".into(),
                    field: Some("export_type".into()),
                },
                400,
                "validation_error",
            ),
            (Error::Capacity { active: 5, limit: 5 }, 429, "capacity_exceeded"),
            (Error::NoData, 422, "no_data"),
            (Error::NotFound("abc".into()), 404, "not_found"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.error_code(), code, "{err}");
        }
    }

    #[test]
    fn state_errors_have_distinct_codes() {
        let not_completed = Error::State(StateError::NotCompleted {
            task_id: "t1".into(),
            status: "PENDING".into(),
        });
        let missing_path = Error::State(StateError::MissingPath {
            task_id: "t1".into(),
        });
        let missing_file = Error::State(StateError::MissingFile {
            task_id: "t1".into(),
            path: PathBuf::from("/tmp/none.xlsx"),
        });

        assert_eq!(not_completed.error_code(), "not_completed");
        assert_eq!(missing_path.error_code(), "missing_artifact_path");
        assert_eq!(missing_file.error_code(), "missing_artifact");
        assert_eq!(not_completed.status_code(), 409);
        assert_eq!(missing_file.status_code(), 404);
    }

    #[test]
    fn api_error_carries_capacity_details() {
        let api: ApiError = Error::Capacity { active: 6, limit: 5 }.into();
        assert_eq!(api.error.code, "capacity_exceeded");
        let details = api.error.details.unwrap();
        assert_eq!(details["active"], 6);
        assert_eq!(details["limit"], 5);
    }
}
