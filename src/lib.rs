//! # excel-export
//!
//! Streaming spreadsheet export service: submit a filtered export task,
//! watch its progress, download the finished artifact.
//!
//! ## Design Philosophy
//!
//! excel-export is designed to be:
//! - **Bounded** - A fixed number of exports run concurrently; overflow runs on the caller
//! - **Durable** - Task state lives in SQLite and survives process restarts
//! - **Streaming** - Rows move source-to-sheet in fixed-size batches, never all at once
//! - **Observable** - Progress, statistics, and memory profiles via structured logging
//!
//! ## Quick Start
//!
//! ```no_run
//! use excel_export::{Config, ExportService, ExportRequest};
//! use excel_export::source::SqliteRowSource;
//! use excel_export::writer::XlsxWriter;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = Arc::new(SqliteRowSource::connect("./data/employees.db".as_ref()).await?);
//!     let service = ExportService::new(config, source, Arc::new(XlsxWriter::new())).await?;
//!
//!     let snapshot = service
//!         .submit(ExportRequest {
//!             export_type: "employee".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("submitted task {}", snapshot.task_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// TTL-bounded status cache
pub mod cache;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Export task orchestration (admission, batch loop, status, download)
pub mod exporter;
/// Per-task process memory sampling
pub mod sampler;
/// Row sources
pub mod source;
/// Core types
pub mod types;
/// Spreadsheet writers
pub mod writer;

// Re-export commonly used types
pub use cache::StatusCache;
pub use config::{ApiConfig, CacheConfig, Config, ExportConfig, PersistenceConfig, SamplerConfig};
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, Result, StateError, ToHttpStatus,
};
pub use exporter::{DownloadArtifact, ExportService, WorkerPool};
pub use sampler::{MemorySampler, memory_status};
pub use source::{EmployeeRow, RowSource, SqliteRowSource};
pub use types::{
    ExportFilter, ExportRequest, ExportStatistics, FileInfo, MemoryStats, MemoryStatus, TaskId,
    TaskSnapshot, TaskStatus,
};
pub use writer::{RowSink, SpreadsheetWriter, XlsxWriter};

use std::sync::Arc;

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `shutdown()`
/// method, which stops admitting new tasks and closes the task store.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use excel_export::{Config, ExportService, run_with_shutdown};
/// use excel_export::source::SqliteRowSource;
/// use excel_export::writer::XlsxWriter;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let source = Arc::new(SqliteRowSource::connect("./data/employees.db".as_ref()).await?);
///     let service = Arc::new(
///         ExportService::new(config, source, Arc::new(XlsxWriter::new())).await?,
///     );
///
///     // Run with automatic signal handling
///     run_with_shutdown(service).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: Arc<ExportService>) {
    wait_for_signal().await;
    service.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
