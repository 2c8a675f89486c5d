use rust_decimal::Decimal;

use crate::error::{PipelineError, Result};
use crate::model::{CellValue, Table};

/// Naming heuristic for amount-like columns.
pub fn is_amount_column(name: &str) -> bool {
    name.to_lowercase().contains("amount")
}

/// Converts amount cells from floating point to exact base-10 decimals.
///
/// Columns are either named explicitly or auto-detected by the "amount"
/// naming heuristic. Conversion goes through the shortest round-trip decimal
/// string of the float, so a workbook cell displaying `0.1` becomes exactly
/// `Decimal(0.1)` rather than its binary approximation. Null cells are
/// preserved unchanged; cells that cannot be parsed are left as-is.
///
/// This must run before any precision-sensitive arithmetic; currency totals
/// are never aggregated in floating point.
pub fn convert_amounts(table: &Table, amount_columns: Option<&[String]>) -> Table {
    let indices: Vec<usize> = match amount_columns {
        Some(explicit) => explicit
            .iter()
            .filter_map(|column| table.column_index(column))
            .collect(),
        None => table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| is_amount_column(column))
            .map(|(index, _)| index)
            .collect(),
    };

    let mut converted = table.clone();
    for row in &mut converted.rows {
        for &index in &indices {
            if let Some(cell) = row.get_mut(index) {
                *cell = to_decimal_cell(cell);
            }
        }
    }

    converted
}

/// Sums one column as exact decimals. Null cells contribute nothing; any
/// other non-decimal cell is an error since aggregation must not silently
/// fall back to floating point.
pub fn sum_column(table: &Table, column: &str) -> Result<Decimal> {
    let index = table.column_index(column).ok_or_else(|| {
        PipelineError::InvalidWorkbook(format!(
            "column '{column}' not found in {}",
            table.name
        ))
    })?;

    let mut total = Decimal::ZERO;
    for cell in table.column(index) {
        match cell {
            CellValue::Empty => {}
            CellValue::Decimal(value) => total += *value,
            other => {
                return Err(PipelineError::InvalidWorkbook(format!(
                    "non-decimal cell '{}' in column '{column}' of {}",
                    other.display(),
                    table.name
                )));
            }
        }
    }

    Ok(total)
}

fn to_decimal_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Number(value) => match parse_decimal(&value.to_string()) {
            Some(decimal) => CellValue::Decimal(decimal),
            None => cell.clone(),
        },
        CellValue::Text(value) => match parse_decimal(value.trim()) {
            Some(decimal) => CellValue::Decimal(decimal),
            None => cell.clone(),
        },
        other => other.clone(),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    text.parse::<Decimal>().ok()
}
