//! Core types for excel-export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for an export task
///
/// Opaque string generated at submission time (UUID v4 without hyphens),
/// immutable for the lifetime of the task.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a fresh task id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for TaskId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Export task status
///
/// Transitions are forward-only: PENDING → PROCESSING → {SUCCESS, FAILED}.
/// PENDING → FAILED directly is also valid (dispatch failure before the
/// PROCESSING transition was persisted). No transition leaves a terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Created, waiting for the batch loop to start
    Pending,
    /// Batch loop running
    Processing,
    /// Completed, artifact available
    Success,
    /// Failed with an error message
    Failed,
}

impl TaskStatus {
    /// Database representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failed => "FAILED",
        }
    }

    /// Parse a database status string
    ///
    /// Unknown strings decode to Failed so corrupted rows surface visibly.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "PENDING" => TaskStatus::Pending,
            "PROCESSING" => TaskStatus::Processing,
            "SUCCESS" => TaskStatus::Success,
            _ => TaskStatus::Failed,
        }
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }

    /// Whether a transition from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => {
                matches!(next, TaskStatus::Processing | TaskStatus::Failed)
            }
            TaskStatus::Processing => {
                matches!(next, TaskStatus::Success | TaskStatus::Failed)
            }
            TaskStatus::Success | TaskStatus::Failed => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Row filter resolved from an export request
///
/// All fields are optional; an empty filter matches every row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExportFilter {
    /// Substring match on username
    #[serde(default)]
    pub name: Option<String>,

    /// Exact match on department
    #[serde(default)]
    pub department: Option<String>,

    /// Lower bound on join time (inclusive)
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Upper bound on join time (inclusive)
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Options for submitting an export task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportRequest {
    /// Export type (required, non-empty)
    pub export_type: String,

    /// Task name (defaults to the configured fallback label)
    #[serde(default)]
    pub task_name: Option<String>,

    /// Structured row filter
    #[serde(default)]
    pub filter: ExportFilter,

    /// Simple scalar filter fields, merged over `filter` when present
    #[serde(default)]
    pub name: Option<String>,

    /// Department filter, merged over `filter.department` when present
    #[serde(default)]
    pub department: Option<String>,

    /// Join-time lower bound, merged over `filter.start_time` when present
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Join-time upper bound, merged over `filter.end_time` when present
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Run the export asynchronously (default: true)
    #[serde(default = "default_async", rename = "async")]
    pub run_async: bool,

    /// Creator identity (defaults to "system")
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_async() -> bool {
    true
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            export_type: String::new(),
            task_name: None,
            filter: ExportFilter::default(),
            name: None,
            department: None,
            start_time: None,
            end_time: None,
            run_async: default_async(),
            created_by: None,
        }
    }
}

impl ExportRequest {
    /// Resolve the effective row filter: the structured filter with the
    /// simple scalar fields layered on top.
    pub fn resolve_filter(&self) -> ExportFilter {
        let mut filter = self.filter.clone();
        if let Some(name) = &self.name {
            filter.name = Some(name.clone());
        }
        if let Some(department) = &self.department {
            filter.department = Some(department.clone());
        }
        if let Some(start) = self.start_time {
            filter.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            filter.end_time = Some(end);
        }
        filter
    }
}

/// Point-in-time view of an export task, returned by submit and status queries
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSnapshot {
    /// Unique task identifier
    pub task_id: TaskId,

    /// Task name
    pub task_name: String,

    /// Export type
    pub export_type: String,

    /// Current status
    pub status: TaskStatus,

    /// Progress percentage (0.0 to 100.0)
    pub progress: f64,

    /// Total matching rows (set at submission)
    pub total_count: u64,

    /// Rows written so far
    pub processed_count: u64,

    /// Artifact file name (set on completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Artifact size in bytes (set on completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Download URL (present only when status is SUCCESS)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Error message (present only when status is FAILED)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creator identity
    pub created_by: String,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the batch loop started (None until PROCESSING)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Memory usage statistics for one export's sampling window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct MemoryStats {
    /// Process memory at sampling start (bytes)
    pub start_bytes: u64,

    /// Peak process memory observed during the window (bytes)
    pub peak_bytes: u64,

    /// Process memory at the time of the snapshot (bytes)
    pub current_bytes: u64,

    /// Peak growth over the window: peak - start (bytes)
    pub increase_bytes: u64,
}

impl MemoryStats {
    /// Start memory in megabytes
    pub fn start_mb(&self) -> f64 {
        self.start_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Peak memory in megabytes
    pub fn peak_mb(&self) -> f64 {
        self.peak_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Current memory in megabytes
    pub fn current_mb(&self) -> f64 {
        self.current_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Peak growth in megabytes
    pub fn increase_mb(&self) -> f64 {
        self.increase_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Live process and host memory reading served by the monitor endpoint
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MemoryStatus {
    /// Resident memory of this process (bytes)
    pub process_bytes: u64,

    /// Memory in use across the host (bytes)
    pub used_bytes: u64,

    /// Total host memory (bytes)
    pub total_bytes: u64,

    /// used / total, the ratio the watermark mitigation compares against
    pub usage_ratio: f64,

    /// Unix timestamp (milliseconds) when the reading was taken
    pub timestamp: i64,
}

/// Export subsystem statistics
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportStatistics {
    /// Number of tasks currently in PROCESSING state
    pub processing_count: i64,

    /// Unix timestamp (milliseconds) when the statistics were gathered
    pub timestamp: i64,
}

/// Artifact information for a task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    /// Task identifier
    pub task_id: TaskId,

    /// Artifact file name, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Artifact size in bytes, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Current task status
    pub status: TaskStatus,

    /// Whether the artifact can be downloaded right now
    pub downloadable: bool,
}

/// Compute the progress percentage for processed/total, clamped to [0, 100]
pub fn progress_percent(processed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((processed as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}
