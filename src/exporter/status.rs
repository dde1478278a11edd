//! Status queries, listings, and statistics.

use chrono::{TimeZone, Utc};

use crate::db::ExportTaskRow;
use crate::types::{ExportStatistics, FileInfo, TaskId, TaskSnapshot, TaskStatus};
use crate::{Error, Result};

use super::ExportService;

/// Largest accepted task-listing page
const MAX_LIST_LIMIT: i64 = 1000;

impl ExportService {
    /// Get the current snapshot of a task
    ///
    /// Reads through the cache: a hit is served directly, a miss falls back
    /// to the store and repopulates the cache.
    pub async fn get_status(&self, task_id: &TaskId) -> Result<TaskSnapshot> {
        if let Some(snapshot) = self.cache.get(task_id).await {
            return Ok(snapshot);
        }

        let row = self
            .db
            .get_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound(task_id.to_string()))?;
        let snapshot = snapshot_from_row(&row);
        self.cache.put(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// List a creator's tasks, most recent first
    ///
    /// A missing creator falls back to the configured default; the limit is
    /// clamped to a sane page size.
    pub async fn list_tasks(
        &self,
        created_by: Option<&str>,
        limit: i64,
    ) -> Result<Vec<TaskSnapshot>> {
        let created_by = created_by
            .map(str::trim)
            .filter(|creator| !creator.is_empty())
            .unwrap_or(&self.config.export.default_creator);
        let limit = limit.clamp(1, MAX_LIST_LIMIT);

        let rows = self.db.list_tasks_by_creator(created_by, limit).await?;
        Ok(rows.iter().map(snapshot_from_row).collect())
    }

    /// Export subsystem statistics
    pub async fn statistics(&self) -> Result<ExportStatistics> {
        let processing_count = self.db.count_processing().await?;
        Ok(ExportStatistics {
            processing_count,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// Artifact information for a task
    pub async fn file_info(&self, task_id: &TaskId) -> Result<FileInfo> {
        let row = self
            .db
            .get_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound(task_id.to_string()))?;

        let status = TaskStatus::from_str_lossy(&row.status);
        let downloadable = status == TaskStatus::Success && row.file_path.is_some();

        Ok(FileInfo {
            task_id: TaskId::from(row.task_id),
            file_name: row.file_name,
            file_size: row.file_size.map(|size| size.max(0) as u64),
            status,
            downloadable,
        })
    }
}

/// Build an API snapshot from a store row
pub(crate) fn snapshot_from_row(row: &ExportTaskRow) -> TaskSnapshot {
    let status = TaskStatus::from_str_lossy(&row.status);
    let to_datetime = |secs: i64| Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now);

    let download_url = if status == TaskStatus::Success {
        Some(format!("/api/v1/export/download/{}", row.task_id))
    } else {
        None
    };

    TaskSnapshot {
        task_id: TaskId::from(row.task_id.clone()),
        task_name: row.task_name.clone(),
        export_type: row.export_type.clone(),
        status,
        progress: row.progress.clamp(0.0, 100.0),
        total_count: row.total_count.max(0) as u64,
        processed_count: row.processed_count.max(0) as u64,
        file_name: row.file_name.clone(),
        file_size: row.file_size.map(|size| size.max(0) as u64),
        download_url,
        error_message: row.error_message.clone(),
        created_by: row.created_by.clone(),
        created_at: to_datetime(row.created_at),
        started_at: row.started_at.map(to_datetime),
        ended_at: row.ended_at.map(to_datetime),
    }
}
