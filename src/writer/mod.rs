//! Spreadsheet output for exports
//!
//! [`SpreadsheetWriter`] opens an artifact on disk and hands back a
//! [`RowSink`] that accepts batches of rows; closing the sink flushes the
//! file. [`XlsxWriter`] is the shipped adapter.

use std::path::Path;

use crate::Result;
use crate::source::EmployeeRow;

mod xlsx;

pub use xlsx::XlsxWriter;

/// Column headers for the fixed export schema, in write order
pub const COLUMNS: [&str; 11] = [
    "ID",
    "Username",
    "Real Name",
    "Email",
    "Phone",
    "Age",
    "Gender",
    "Department",
    "Position",
    "Salary",
    "Joined At",
];

/// Factory for spreadsheet artifacts
pub trait SpreadsheetWriter: Send + Sync {
    /// Open a new artifact at `path` with the header row written
    fn open(&self, path: &Path) -> Result<Box<dyn RowSink>>;

    /// File extension for artifacts produced by this writer, without the dot
    fn file_extension(&self) -> &'static str;
}

/// An open spreadsheet accepting row batches
pub trait RowSink: Send {
    /// Append a batch of rows after the rows already written
    fn append_rows(&mut self, rows: &[EmployeeRow]) -> Result<()>;

    /// Flush and close the artifact
    fn finish(self: Box<Self>) -> Result<()>;
}
