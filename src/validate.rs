use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use crate::amounts::is_amount_column;
use crate::error::Result;
use crate::io::excel_read;
use crate::io::files::validate_file_exists;
use crate::model::{CellValue, Table};

/// Validates the structure of a loaded department table.
///
/// Every check runs; none short-circuits. The table is valid iff the returned
/// issue list is empty. Validation failure is non-fatal to a consolidation
/// run: the caller records the issues and skips the file.
pub fn validate_table(table: &Table, required_columns: &[String]) -> (bool, Vec<String>) {
    let mut issues = Vec::new();

    check_required_columns(table, required_columns, &mut issues);
    check_duplicate_columns(table, &mut issues);
    check_empty_columns(table, &mut issues);
    check_amount_columns(table, &mut issues);
    check_has_rows(table, &mut issues);

    let is_valid = issues.is_empty();
    if is_valid {
        info!(file = %table.name, "validation passed");
    } else {
        warn!(file = %table.name, issues = ?issues, "validation failed");
    }

    (is_valid, issues)
}

/// Validates one file on disk: existence check, load, then structural checks.
pub fn validate_file(path: &Path, required_columns: &[String]) -> Result<(bool, Vec<String>)> {
    validate_file_exists(path)?;
    let table = excel_read::read_table(path)?;
    Ok(validate_table(&table, required_columns))
}

fn check_required_columns(table: &Table, required_columns: &[String], issues: &mut Vec<String>) {
    let present: BTreeSet<&str> = table.columns.iter().map(String::as_str).collect();
    let missing: Vec<&str> = required_columns
        .iter()
        .map(String::as_str)
        .filter(|column| !present.contains(column))
        .collect();

    if !missing.is_empty() {
        issues.push(format!("Missing required columns: {}", missing.join(", ")));
    }
}

fn check_duplicate_columns(table: &Table, issues: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for column in &table.columns {
        if !seen.insert(column.as_str()) && !duplicates.contains(&column.as_str()) {
            duplicates.push(column.as_str());
        }
    }

    if !duplicates.is_empty() {
        issues.push(format!("Duplicate column names: {}", duplicates.join(", ")));
    }
}

fn check_empty_columns(table: &Table, issues: &mut Vec<String>) {
    if table.rows.is_empty() {
        return;
    }

    let empty: Vec<&str> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| table.column(*index).all(CellValue::is_empty))
        .map(|(_, column)| column.as_str())
        .collect();

    if !empty.is_empty() {
        issues.push(format!("Completely empty columns: {}", empty.join(", ")));
    }
}

// Iterates by index so duplicated amount headers are each inspected.
fn check_amount_columns(table: &Table, issues: &mut Vec<String>) {
    for (index, column) in table.columns.iter().enumerate() {
        if !is_amount_column(column) {
            continue;
        }
        let non_numeric = table
            .column(index)
            .filter(|cell| !is_numeric_or_null(cell))
            .count();
        if non_numeric > 0 {
            issues.push(format!(
                "Non-numeric values in amount column '{column}': {non_numeric} rows"
            ));
        }
    }
}

fn check_has_rows(table: &Table, issues: &mut Vec<String>) {
    if table.rows.is_empty() {
        issues.push("File contains no data rows (only headers)".to_string());
    }
}

// Null amounts are legitimate and preserved by the decimal converter, so an
// empty cell is not flagged here.
fn is_numeric_or_null(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty | CellValue::Number(_) | CellValue::Decimal(_) => true,
        CellValue::Text(value) => value.trim().parse::<f64>().is_ok(),
        CellValue::Boolean(_) => false,
    }
}
