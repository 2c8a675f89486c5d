use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A single cell in a loaded department table.
///
/// Amounts start life as [`CellValue::Number`] when read from a workbook and
/// are promoted to [`CellValue::Decimal`] by the amount converter. Once a cell
/// holds a `Decimal` it is never coerced back to floating point; the Excel
/// writer emits the exact decimal string.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (null).
    Empty,
    /// Plain text cell.
    Text(String),
    /// Floating point number as read from the workbook.
    Number(f64),
    /// Exact base-10 decimal amount.
    Decimal(Decimal),
    /// Boolean cell.
    Boolean(bool),
}

impl CellValue {
    /// Returns `true` for empty (null) cells.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Renders the cell as the string used for lookups and output cells.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Decimal(value) => value.to_string(),
            CellValue::Boolean(value) => value.to_string(),
        }
    }
}

/// An in-memory table backing one spreadsheet: ordered column headers plus
/// rows of cells. Duplicate header names are preserved exactly as read so the
/// validator can flag them.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the table, usually the originating file name.
    pub name: String,
    /// Column headers in sheet order.
    pub columns: Vec<String>,
    /// Data rows, each the same width as `columns`.
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates an empty table with the provided headers.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of data rows (excluding the header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Appends a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    /// Iterates over the cells of one column.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&CellValue::Empty))
    }
}

/// Mutable accumulator describing one consolidation run. Created when the run
/// starts, finalized when it ends, and handed back to the caller (or embedded
/// in the failure error) together with the audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub source_folder: PathBuf,
    pub source_files: Vec<PathBuf>,
    pub file_count: usize,
    pub records_per_file: BTreeMap<String, usize>,
    pub unmapped_accounts_by_file: BTreeMap<String, Vec<String>>,
    pub total_records: usize,
    pub validation_issues: BTreeMap<String, Vec<String>>,
    pub unmapped_count: usize,
    pub success: bool,
    pub output_file: Option<PathBuf>,
    pub error: Option<String>,
}

impl RunMetadata {
    /// Opens a metadata record for a run over the given source folder.
    pub fn begin(source_folder: &Path) -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            source_folder: source_folder.to_path_buf(),
            source_files: Vec::new(),
            file_count: 0,
            records_per_file: BTreeMap::new(),
            unmapped_accounts_by_file: BTreeMap::new(),
            total_records: 0,
            validation_issues: BTreeMap::new(),
            unmapped_count: 0,
            success: false,
            output_file: None,
            error: None,
        }
    }

    /// Stamps the end time and marks the run successful.
    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
        self.success = true;
    }

    /// Stamps the end time and records the failure message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.end_time = Some(Utc::now());
        self.success = false;
        self.error = Some(message.into());
    }

    /// Number of files that passed validation and were loaded.
    pub fn files_processed(&self) -> usize {
        self.source_files.len()
    }
}
