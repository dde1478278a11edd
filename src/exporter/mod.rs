//! Export orchestration
//!
//! [`ExportService`] owns the task store, status cache, row source, and
//! spreadsheet writer, and drives every export from submission to the
//! finished artifact.
//!
//! ## Submodules
//!
//! Methods on [`ExportService`] are organized by concern:
//! - [`submit`] — Validation, admission control, task creation, dispatch
//! - [`batch_loop`] — The fetch, write, persist loop
//! - [`status`] — Status queries, listings, statistics
//! - [`download`] — Artifact resolution for downloads

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cache::StatusCache;
use crate::config::Config;
use crate::db::Database;
use crate::source::RowSource;
use crate::writer::SpreadsheetWriter;
use crate::{Error, Result};

mod batch_loop;
mod download;
mod status;
mod submit;
mod worker_pool;

pub use download::{DownloadArtifact, XLSX_CONTENT_TYPE};
pub use worker_pool::WorkerPool;

/// The export orchestrator
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct ExportService {
    db: Arc<Database>,
    cache: StatusCache,
    source: Arc<dyn RowSource>,
    writer: Arc<dyn SpreadsheetWriter>,
    config: Arc<Config>,
    export_pool: WorkerPool,
    maintenance_pool: WorkerPool,
    accepting_new: Arc<AtomicBool>,
}

impl ExportService {
    /// Create the export service
    ///
    /// Validates the configuration, creates the artifact directory, opens the
    /// task database, and starts the cache sweeper.
    pub async fn new(
        config: Config,
        source: Arc<dyn RowSource>,
        writer: Arc<dyn SpreadsheetWriter>,
    ) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.export.temp_dir)
            .await
            .map_err(|e| Error::Config {
                message: format!("failed to create artifact directory: {}", e),
                key: Some("export.temp_dir".to_string()),
            })?;

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);
        let cache = StatusCache::new(Duration::from_secs(config.cache.ttl_minutes * 60));
        let export_pool = WorkerPool::new(config.export.max_concurrent_tasks);
        let maintenance_pool = WorkerPool::new(1);

        let service = Self {
            db,
            cache,
            source,
            writer,
            config: Arc::new(config),
            export_pool,
            maintenance_pool,
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        service.start_cache_sweeper();

        tracing::info!(
            max_concurrent_tasks = service.config.export.max_concurrent_tasks,
            batch_size = service.config.export.batch_size,
            "export service started"
        );

        Ok(service)
    }

    /// Spawn the periodic expired-entry sweep
    ///
    /// Each tick submits the sweep to the maintenance pool; the loop task is
    /// abandoned on shutdown (plain tokio tasks never block process exit).
    fn start_cache_sweeper(&self) {
        let cache = self.cache.clone();
        let pool = self.maintenance_pool.clone();
        let interval = Duration::from_secs(self.config.cache.sweep_interval_secs);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let cache = cache.clone();
                pool.spawn_or_run(async move {
                    let removed = cache.remove_expired().await;
                    if removed > 0 {
                        tracing::debug!(removed, "swept expired status cache entries");
                    }
                })
                .await;
            }
        });
    }

    /// The service configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop accepting new exports and close the task database
    ///
    /// In-flight batch loops are not cancelled; they fail on their next store
    /// write once the pool is closed.
    pub async fn shutdown(&self) {
        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("export service shutting down");
        self.db.close().await;
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
pub(crate) mod test_helpers;
