use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::error::{PipelineError, Result};
use crate::model::{CellValue, Table};

/// Reads the first worksheet of a workbook into a [`Table`].
///
/// The first row supplies the column headers (duplicates preserved so the
/// validator can flag them); every following row becomes a data row. Rows
/// consisting solely of empty cells are dropped.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::InvalidWorkbook("workbook contains no sheets".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| PipelineError::InvalidWorkbook(format!("missing sheet '{sheet_name}'")))?
        .map_err(PipelineError::from)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(file_name, columns);
    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(cell_to_value).collect();
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(cells);
    }

    Ok(table)
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => {
            if value.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(value.clone())
            }
        }
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => value.to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}
