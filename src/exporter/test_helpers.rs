//! Shared fixtures for exporter tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::source::{EmployeeRow, RowSource};
use crate::types::ExportFilter;
use crate::writer::{RowSink, SpreadsheetWriter};
use crate::{Error, Result};

use super::ExportService;

/// Config pointed at a temp directory, with fast test-friendly intervals
pub(crate) fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.export.temp_dir = dir.join("artifacts");
    config.export.batch_size = 10;
    config.export.memory_check_interval = 1000;
    config.persistence.database_path = dir.join("tasks.db");
    config.cache.sweep_interval_secs = 3600;
    config.sampler.interval_ms = 10;
    config
}

pub(crate) async fn test_service(
    config: Config,
    source: Arc<dyn RowSource>,
    writer: Arc<dyn SpreadsheetWriter>,
) -> ExportService {
    ExportService::new(config, source, writer).await.unwrap()
}

pub(crate) fn synthetic_row(id: i64) -> EmployeeRow {
    EmployeeRow {
        id,
        username: format!("user{id}"),
        real_name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        phone: "555-0100".to_string(),
        age: 30,
        gender: "other".to_string(),
        department: "engineering".to_string(),
        position: "engineer".to_string(),
        salary: 50_000.0,
        joined_at: 1_600_000_000,
    }
}

/// Source producing `total` synthetic rows in stable order
pub(crate) struct FakeRowSource {
    pub total: u64,
}

#[async_trait]
impl RowSource for FakeRowSource {
    async fn count(&self, _filter: &ExportFilter) -> Result<u64> {
        Ok(self.total)
    }

    async fn fetch_batch(
        &self,
        _filter: &ExportFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<EmployeeRow>> {
        if offset >= self.total {
            return Ok(Vec::new());
        }
        let end = (offset + limit).min(self.total);
        Ok((offset..end).map(|i| synthetic_row(i as i64 + 1)).collect())
    }
}

/// Source whose count exceeds the rows it can actually produce
pub(crate) struct ShrinkingRowSource {
    pub counted: u64,
    pub actual: u64,
}

#[async_trait]
impl RowSource for ShrinkingRowSource {
    async fn count(&self, _filter: &ExportFilter) -> Result<u64> {
        Ok(self.counted)
    }

    async fn fetch_batch(
        &self,
        _filter: &ExportFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<EmployeeRow>> {
        if offset >= self.actual {
            return Ok(Vec::new());
        }
        let end = (offset + limit).min(self.actual);
        Ok((offset..end).map(|i| synthetic_row(i as i64 + 1)).collect())
    }
}

/// Source that counts fine but fails on every fetch
pub(crate) struct FailingRowSource;

#[async_trait]
impl RowSource for FailingRowSource {
    async fn count(&self, _filter: &ExportFilter) -> Result<u64> {
        Ok(100)
    }

    async fn fetch_batch(
        &self,
        _filter: &ExportFilter,
        _offset: u64,
        _limit: u64,
    ) -> Result<Vec<EmployeeRow>> {
        Err(Error::Other("synthetic source failure".to_string()))
    }
}

/// Writer that records batch sizes instead of producing a spreadsheet
///
/// Still creates the artifact file so size stat and download resolution work.
pub(crate) struct CountingWriter {
    pub batches: Arc<Mutex<Vec<usize>>>,
}

impl CountingWriter {
    pub(crate) fn new() -> (Self, Arc<Mutex<Vec<usize>>>) {
        let batches = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                batches: Arc::clone(&batches),
            },
            batches,
        )
    }
}

impl SpreadsheetWriter for CountingWriter {
    fn open(&self, path: &Path) -> Result<Box<dyn RowSink>> {
        std::fs::File::create(path)?;
        Ok(Box::new(CountingSink {
            batches: Arc::clone(&self.batches),
        }))
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }
}

struct CountingSink {
    batches: Arc<Mutex<Vec<usize>>>,
}

impl RowSink for CountingSink {
    fn append_rows(&mut self, rows: &[EmployeeRow]) -> Result<()> {
        self.batches.lock().unwrap().push(rows.len());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Writer whose sink fails on the first append
pub(crate) struct FailingWriter;

impl SpreadsheetWriter for FailingWriter {
    fn open(&self, path: &Path) -> Result<Box<dyn RowSink>> {
        std::fs::File::create(path)?;
        Ok(Box::new(FailingSink))
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }
}

struct FailingSink;

impl RowSink for FailingSink {
    fn append_rows(&mut self, _rows: &[EmployeeRow]) -> Result<()> {
        Err(Error::Spreadsheet("synthetic writer failure".to_string()))
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
