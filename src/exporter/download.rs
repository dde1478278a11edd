//! Artifact resolution for downloads.

use std::path::PathBuf;

use crate::error::StateError;
use crate::types::{TaskId, TaskStatus};
use crate::{Error, Result};

use super::ExportService;

/// MIME type of the XLSX artifacts
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A resolved, downloadable artifact
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    /// Absolute path on disk
    pub path: PathBuf,
    /// File name for the attachment disposition
    pub file_name: String,
    /// Size in bytes, from the filesystem
    pub file_size: u64,
    /// MIME type
    pub content_type: &'static str,
}

impl ExportService {
    /// Resolve a task's artifact for download
    ///
    /// Each precondition has its own error: the task must exist, must have
    /// completed successfully, must carry an artifact path, and the file must
    /// still be present on disk.
    pub async fn resolve_download(&self, task_id: &TaskId) -> Result<DownloadArtifact> {
        let row = self
            .db
            .get_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound(task_id.to_string()))?;

        let status = TaskStatus::from_str_lossy(&row.status);
        if status != TaskStatus::Success {
            return Err(StateError::NotCompleted {
                task_id: task_id.to_string(),
                status: row.status,
            }
            .into());
        }

        let path = row.file_path.ok_or_else(|| StateError::MissingPath {
            task_id: task_id.to_string(),
        })?;
        let path = PathBuf::from(path);

        let metadata =
            tokio::fs::metadata(&path)
                .await
                .map_err(|_| StateError::MissingFile {
                    task_id: task_id.to_string(),
                    path: path.clone(),
                })?;

        let file_name = row.file_name.unwrap_or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.xlsx", task_id))
        });

        Ok(DownloadArtifact {
            path,
            file_name,
            file_size: metadata.len(),
            content_type: XLSX_CONTENT_TYPE,
        })
    }
}
