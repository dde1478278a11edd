//! Submission: validation, admission control, task creation, dispatch.

use std::sync::atomic::Ordering;

use crate::db::NewExportTask;
use crate::types::{ExportRequest, TaskId, TaskSnapshot};
use crate::{Error, Result};

use super::ExportService;
use super::status::snapshot_from_row;

impl ExportService {
    /// Submit a new export task
    ///
    /// Validates the request, applies the concurrency ceiling, counts the
    /// matching rows, persists a PENDING record, and dispatches the batch
    /// loop. Asynchronous requests return the PENDING snapshot immediately;
    /// synchronous requests run the export to completion on the caller and
    /// re-raise its failure.
    ///
    /// The ceiling check reads a fresh PROCESSING count, so two concurrent
    /// submissions can both pass it; the limit is a soft one.
    pub async fn submit(&self, request: ExportRequest) -> Result<TaskSnapshot> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        if request.export_type.trim().is_empty() {
            return Err(Error::Validation {
                message: "export_type must not be empty".to_string(),
                field: Some("export_type".to_string()),
            });
        }

        let active = self.db.count_processing().await?;
        let limit = self.config.export.max_concurrent_tasks;
        if active >= limit as i64 {
            return Err(Error::Capacity { active, limit });
        }

        let filter = request.resolve_filter();
        let total = self.source.count(&filter).await?;
        if total == 0 {
            return Err(Error::NoData);
        }

        let task_id = TaskId::generate();
        let task_name = request
            .task_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.config.export.default_task_name)
            .to_string();
        let created_by = request
            .created_by
            .as_deref()
            .map(str::trim)
            .filter(|creator| !creator.is_empty())
            .unwrap_or(&self.config.export.default_creator)
            .to_string();

        self.db
            .insert_task(&NewExportTask {
                task_id: task_id.clone(),
                task_name: task_name.clone(),
                export_type: request.export_type.clone(),
                created_by,
                total_count: total as i64,
            })
            .await?;

        let row = self
            .db
            .get_task(&task_id)
            .await?
            .ok_or_else(|| Error::NotFound(task_id.to_string()))?;
        let snapshot = snapshot_from_row(&row);
        self.cache.put(snapshot.clone()).await;

        tracing::info!(
            task_id = %task_id,
            task_name = %task_name,
            export_type = %request.export_type,
            total_count = total,
            run_async = request.run_async,
            "export task submitted"
        );

        if request.run_async {
            let service = self.clone();
            let id = task_id.clone();
            let filter = filter.clone();
            self.export_pool
                .spawn_or_run(async move {
                    if let Err(e) = service.run_export(&id, &filter).await {
                        tracing::error!(task_id = %id, error = %e, "export task failed");
                    }
                })
                .await;
            Ok(snapshot)
        } else {
            self.run_export(&task_id, &filter).await?;
            self.get_status(&task_id).await
        }
    }
}
