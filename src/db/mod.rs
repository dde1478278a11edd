//! Database layer for excel-export
//!
//! Handles SQLite persistence for export task records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`tasks`] — Export task CRUD and targeted updates

use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod tasks;

/// New export task to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewExportTask {
    /// Opaque task identifier (UUID v4 without hyphens)
    pub task_id: crate::types::TaskId,
    /// Display name for this export
    pub task_name: String,
    /// Export type label (e.g. "user")
    pub export_type: String,
    /// Identity that submitted the task
    pub created_by: String,
    /// Total rows matching the filter, counted at submission
    pub total_count: i64,
}

/// Export task record from database
#[derive(Debug, Clone, FromRow)]
pub struct ExportTaskRow {
    /// Opaque task identifier
    pub task_id: String,
    /// Display name for this export
    pub task_name: String,
    /// Export type label
    pub export_type: String,
    /// Identity that submitted the task
    pub created_by: String,
    /// Current status (PENDING, PROCESSING, SUCCESS, FAILED)
    pub status: String,
    /// Total rows matching the filter, counted at submission
    pub total_count: i64,
    /// Rows written so far
    pub processed_count: i64,
    /// Progress percentage (0.0-100.0)
    pub progress: f64,
    /// Absolute path of the artifact on disk
    pub file_path: Option<String>,
    /// Artifact file name
    pub file_name: Option<String>,
    /// Artifact size in bytes
    pub file_size: Option<i64>,
    /// Error message if the export failed
    pub error_message: Option<String>,
    /// Unix timestamp when the task was created
    pub created_at: i64,
    /// Unix timestamp when the batch loop started
    pub started_at: Option<i64>,
    /// Unix timestamp when the task reached a terminal state
    pub ended_at: Option<i64>,
    /// Unix timestamp of the last update
    pub updated_at: i64,
}

/// Database handle for excel-export
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
