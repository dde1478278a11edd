//! The batch loop: fetch, write, persist, repeat.

use chrono::Utc;

use crate::sampler::{MemorySampler, check_memory_pressure};
use crate::types::{ExportFilter, TaskId, TaskStatus, progress_percent};
use crate::{Error, Result};

use super::ExportService;
use super::status::snapshot_from_row;

impl ExportService {
    /// Run one export task to a terminal state
    ///
    /// Wraps the batch loop with the memory sampler and finalization: SUCCESS
    /// on completion, FAILED with the error message otherwise. Loop faults
    /// re-raise as [`Error::Execution`]; an unknown task id stays
    /// [`Error::NotFound`]. Finalization is idempotent at the store level,
    /// so a duplicate invocation cannot flip a finished task.
    pub(crate) async fn run_export(&self, task_id: &TaskId, filter: &ExportFilter) -> Result<()> {
        let sampler = MemorySampler::new(task_id.clone(), &self.config.sampler);
        sampler.start().await;

        let result = self.drive_batches(task_id, filter).await;

        sampler.stop().await;
        let stats = sampler.stats();
        tracing::info!(
            task_id = %task_id,
            peak_mb = format!("{:.1}", stats.peak_mb()),
            increase_mb = format!("{:.1}", stats.increase_mb()),
            "export memory profile"
        );

        match result {
            Ok(()) => {
                self.db.mark_ended(task_id, TaskStatus::Success, None).await?;
                self.refresh_cache(task_id).await;
                tracing::info!(task_id = %task_id, "export completed");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(db_err) = self
                    .db
                    .mark_ended(task_id, TaskStatus::Failed, Some(&message))
                    .await
                {
                    tracing::error!(
                        task_id = %task_id,
                        error = %db_err,
                        "failed to record export failure"
                    );
                }
                self.refresh_cache(task_id).await;
                Err(match e {
                    Error::NotFound(_) => e,
                    _ => Error::Execution(message),
                })
            }
        }
    }

    /// Drive the fetch/write/persist loop for one task
    async fn drive_batches(&self, task_id: &TaskId, filter: &ExportFilter) -> Result<()> {
        let row = self
            .db
            .get_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound(task_id.to_string()))?;
        let total = row.total_count.max(0) as u64;

        self.db.mark_started(task_id).await?;
        self.refresh_cache(task_id).await;

        let file_name = artifact_file_name(&row.task_name, self.writer.file_extension());
        let path = self.config.export.temp_dir.join(&file_name);
        let mut sink = self.writer.open(&path)?;

        let batch_size = self.config.export.batch_size;
        let check_interval = self.config.export.memory_check_interval.max(1);
        let mut processed: u64 = 0;
        let mut batches: u64 = 0;

        while processed < total {
            let rows = self.source.fetch_batch(filter, processed, batch_size).await?;
            if rows.is_empty() {
                // The source shrank between counting and paging; finish with
                // what was actually written.
                tracing::warn!(
                    task_id = %task_id,
                    processed,
                    total,
                    "source returned no rows before reaching the counted total"
                );
                break;
            }

            sink.append_rows(&rows)?;
            processed += rows.len() as u64;
            batches += 1;

            let progress = progress_percent(processed, total);
            self.db
                .update_progress(task_id, processed as i64, progress)
                .await?;
            self.refresh_cache(task_id).await;

            if batches % check_interval == 0 {
                check_memory_pressure(task_id, &self.config.sampler).await;
            }
        }

        sink.finish()?;

        let file_size = tokio::fs::metadata(&path).await?.len();
        self.db
            .update_file_info(task_id, &path.to_string_lossy(), &file_name, file_size as i64)
            .await?;

        tracing::debug!(
            task_id = %task_id,
            file_name = %file_name,
            file_size,
            processed,
            "artifact written"
        );

        Ok(())
    }

    /// Re-read a task row and write its snapshot through to the cache
    ///
    /// The cache is advisory, so failures here are logged and swallowed.
    pub(crate) async fn refresh_cache(&self, task_id: &TaskId) {
        match self.db.get_task(task_id).await {
            Ok(Some(row)) => self.cache.put(snapshot_from_row(&row)).await,
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(task_id = %task_id, error = %e, "status cache refresh failed");
            }
        }
    }
}

/// Build the artifact file name: `{task_name}_{yyyyMMdd_HHmmss}.{ext}` with
/// path-hostile characters replaced
fn artifact_file_name(task_name: &str, extension: &str) -> String {
    let sanitized: String = task_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", sanitized, timestamp, extension)
}
