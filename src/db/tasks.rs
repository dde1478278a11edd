//! Export task CRUD and targeted updates.

use crate::error::DatabaseError;
use crate::types::{TaskId, TaskStatus};
use crate::{Error, Result};

use super::{Database, ExportTaskRow, NewExportTask};

impl Database {
    /// Insert a new export task in PENDING state
    pub async fn insert_task(&self, task: &NewExportTask) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO export_tasks
                (task_id, task_name, export_type, created_by, status,
                 total_count, processed_count, progress, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'PENDING', ?, 0, 0.0, ?, ?)
            "#,
        )
        .bind(&task.task_id)
        .bind(&task.task_name)
        .bind(&task.export_type)
        .bind(&task.created_by)
        .bind(task.total_count)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert export task: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get an export task by id
    pub async fn get_task(&self, task_id: &TaskId) -> Result<Option<ExportTaskRow>> {
        let row = sqlx::query_as::<_, ExportTaskRow>(
            "SELECT * FROM export_tasks WHERE task_id = ?",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get export task: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Update a task's status
    ///
    /// Terminal rows (SUCCESS, FAILED) are never modified; updating one is a
    /// silent no-op so late finalization attempts stay idempotent.
    pub async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE export_tasks
            SET status = ?, updated_at = ?
            WHERE task_id = ? AND status NOT IN ('SUCCESS', 'FAILED')
            "#,
        )
        .bind(status.as_str())
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update task status: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record the batch-loop start: PROCESSING status + started_at timestamp
    pub async fn mark_started(&self, task_id: &TaskId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE export_tasks
            SET status = 'PROCESSING', started_at = ?, updated_at = ?
            WHERE task_id = ? AND status NOT IN ('SUCCESS', 'FAILED')
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark task started: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record a terminal state: SUCCESS or FAILED, with optional error message
    ///
    /// The terminal-state guard makes duplicate finalization a no-op.
    pub async fn mark_ended(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE export_tasks
            SET status = ?, error_message = ?, ended_at = ?, updated_at = ?
            WHERE task_id = ? AND status NOT IN ('SUCCESS', 'FAILED')
            "#,
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(now)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark task ended: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Update processed count and progress percentage
    pub async fn update_progress(
        &self,
        task_id: &TaskId,
        processed_count: i64,
        progress: f64,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE export_tasks
            SET processed_count = ?, progress = ?, updated_at = ?
            WHERE task_id = ?
            "#,
        )
        .bind(processed_count)
        .bind(progress)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update task progress: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record the finished artifact's path, name, and size
    pub async fn update_file_info(
        &self,
        task_id: &TaskId,
        file_path: &str,
        file_name: &str,
        file_size: i64,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE export_tasks
            SET file_path = ?, file_name = ?, file_size = ?, updated_at = ?
            WHERE task_id = ?
            "#,
        )
        .bind(file_path)
        .bind(file_name)
        .bind(file_size)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update task file info: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Count tasks currently in PROCESSING state
    pub async fn count_processing(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM export_tasks WHERE status = 'PROCESSING'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to count processing tasks: {}",
                e
            )))
        })?;

        Ok(count)
    }

    /// List a creator's tasks, most recent first
    pub async fn list_tasks_by_creator(
        &self,
        created_by: &str,
        limit: i64,
    ) -> Result<Vec<ExportTaskRow>> {
        let rows = sqlx::query_as::<_, ExportTaskRow>(
            r#"
            SELECT * FROM export_tasks
            WHERE created_by = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(created_by)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list export tasks: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
