//! SQLite adapter for [`RowSource`].

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use crate::error::DatabaseError;
use crate::types::ExportFilter;
use crate::{Error, Result};

use super::{EmployeeRow, RowSource};

/// Row source backed by an `employees` table in SQLite
pub struct SqliteRowSource {
    pool: SqlitePool,
}

impl SqliteRowSource {
    /// Connect to an existing employee database
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse source database path: {}",
                    e
                )))
            })?
            .read_only(true);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to source database: {}",
                e
            )))
        })?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Build the WHERE clause for a filter; bind values are applied in the
    /// same order by `bind_filter`.
    fn where_clause(filter: &ExportFilter) -> String {
        let mut conditions = Vec::new();
        if filter.name.is_some() {
            conditions.push("username LIKE ?");
        }
        if filter.department.is_some() {
            conditions.push("department = ?");
        }
        if filter.start_time.is_some() {
            conditions.push("joined_at >= ?");
        }
        if filter.end_time.is_some() {
            conditions.push("joined_at <= ?");
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut query = $query;
        if let Some(name) = &$filter.name {
            query = query.bind(format!("%{}%", name));
        }
        if let Some(department) = &$filter.department {
            query = query.bind(department.clone());
        }
        if let Some(start) = $filter.start_time {
            query = query.bind(start.timestamp());
        }
        if let Some(end) = $filter.end_time {
            query = query.bind(end.timestamp());
        }
        query
    }};
}

#[async_trait]
impl RowSource for SqliteRowSource {
    async fn count(&self, filter: &ExportFilter) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM employees{}",
            Self::where_clause(filter)
        );

        let query = sqlx::query_scalar::<_, i64>(&sql);
        let count = bind_filter!(query, filter)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count export rows: {}",
                    e
                )))
            })?;

        Ok(count.max(0) as u64)
    }

    async fn fetch_batch(
        &self,
        filter: &ExportFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<EmployeeRow>> {
        let sql = format!(
            "SELECT id, username, real_name, email, phone, age, gender, department, position, salary, joined_at \
             FROM employees{} ORDER BY id LIMIT ? OFFSET ?",
            Self::where_clause(filter)
        );

        let query = sqlx::query_as::<_, EmployeeRow>(&sql);
        let rows = bind_filter!(query, filter)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to fetch export batch: {}",
                    e
                )))
            })?;

        Ok(rows)
    }
}
