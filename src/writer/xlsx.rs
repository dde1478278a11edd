//! XLSX adapter for [`SpreadsheetWriter`].

use chrono::{TimeZone, Utc};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::source::EmployeeRow;

use super::{COLUMNS, RowSink, SpreadsheetWriter};

/// Single-sheet XLSX writer over `rust_xlsxwriter`
///
/// The worksheet runs in constant-memory mode: rows are flushed to backing
/// storage as soon as a higher row is written, so only the current batch
/// plus writer-internal buffers stay resident regardless of the export size.
/// Constant-memory mode requires strictly increasing row numbers, which the
/// append-only sink guarantees.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxWriter;

impl XlsxWriter {
    /// Create an XLSX writer
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetWriter for XlsxWriter {
    fn open(&self, path: &Path) -> Result<Box<dyn RowSink>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet_with_constant_memory();

        for (col, header) in COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }

        Ok(Box::new(XlsxSink {
            workbook,
            path: path.to_path_buf(),
            next_row: 1,
        }))
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }
}

struct XlsxSink {
    workbook: Workbook,
    path: PathBuf,
    next_row: u32,
}

impl RowSink for XlsxSink {
    fn append_rows(&mut self, rows: &[EmployeeRow]) -> Result<()> {
        let worksheet = self.workbook.worksheet_from_index(0)?;

        for row in rows {
            let r = self.next_row;
            worksheet.write_number(r, 0, row.id as f64)?;
            worksheet.write_string(r, 1, &row.username)?;
            worksheet.write_string(r, 2, &row.real_name)?;
            worksheet.write_string(r, 3, &row.email)?;
            worksheet.write_string(r, 4, &row.phone)?;
            worksheet.write_number(r, 5, row.age as f64)?;
            worksheet.write_string(r, 6, &row.gender)?;
            worksheet.write_string(r, 7, &row.department)?;
            worksheet.write_string(r, 8, &row.position)?;
            worksheet.write_number(r, 9, row.salary)?;
            worksheet.write_string(r, 10, &format_joined_at(row.joined_at))?;
            self.next_row += 1;
        }

        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.workbook.save(&self.path)?;
        Ok(())
    }
}

fn format_joined_at(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => timestamp.to_string(),
    }
}
