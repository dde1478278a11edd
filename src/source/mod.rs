//! Relational row source for exports
//!
//! [`RowSource`] is the seam between the export pipeline and the dataset
//! being exported: count how many rows a filter matches, then page through
//! them in stable order. [`SqliteRowSource`] is the shipped adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::Result;
use crate::types::ExportFilter;

mod sqlite;

pub use sqlite::SqliteRowSource;

/// One row of the fixed export schema
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct EmployeeRow {
    /// Primary key
    pub id: i64,
    /// Login name
    pub username: String,
    /// Display name
    pub real_name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Age in years
    pub age: i64,
    /// Gender label
    pub gender: String,
    /// Department name
    pub department: String,
    /// Position title
    pub position: String,
    /// Salary amount
    pub salary: f64,
    /// Unix timestamp of joining
    pub joined_at: i64,
}

/// Paged, filterable source of export rows
///
/// `fetch_batch` must return rows in a stable order so consecutive pages
/// never overlap. There is no per-call timeout; a stalled source stalls its
/// export task.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Count the rows matching `filter`
    async fn count(&self, filter: &ExportFilter) -> Result<u64>;

    /// Fetch up to `limit` rows matching `filter`, starting at `offset`
    async fn fetch_batch(
        &self,
        filter: &ExportFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<EmployeeRow>>;
}
