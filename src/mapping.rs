use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::model::{CellValue, Table};

/// Department account code → corporate account code, validated at load time.
pub type AccountMapping = BTreeMap<String, String>;

/// Column name used to tag consolidated rows with their originating file.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Status assigned to reconciliation report rows awaiting a mapping entry.
pub const STATUS_NEEDS_MAPPING: &str = "Needs Mapping";

/// Maps department account codes onto the corporate chart of accounts.
///
/// Returns a new table carrying a `target_column` populated by dictionary
/// lookup on `source_column`, together with the distinct source codes that
/// have no mapping entry (in first-seen order). A pre-existing target column
/// is overwritten rather than duplicated. Rows bearing an unmapped code keep
/// an empty target cell; empty source cells are not reported as unmapped.
pub fn map_account_codes(
    table: &Table,
    mapping: &AccountMapping,
    source_column: &str,
    target_column: &str,
) -> Result<(Table, Vec<String>)> {
    let source_index = table.column_index(source_column).ok_or_else(|| {
        PipelineError::Mapping(format!(
            "source column '{source_column}' not found in {}",
            table.name
        ))
    })?;

    let mut mapped = table.clone();
    let target_index = match mapped.column_index(target_column) {
        Some(index) => index,
        None => {
            mapped.columns.push(target_column.to_string());
            for row in &mut mapped.rows {
                row.push(CellValue::Empty);
            }
            mapped.columns.len() - 1
        }
    };

    let mut unmapped = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for row in &mut mapped.rows {
        let code = row
            .get(source_index)
            .map(CellValue::display)
            .unwrap_or_default();

        let target = if code.is_empty() {
            CellValue::Empty
        } else {
            match mapping.get(&code) {
                Some(corporate) => CellValue::Text(corporate.clone()),
                None => {
                    if seen.insert(code.clone()) {
                        unmapped.push(code);
                    }
                    CellValue::Empty
                }
            }
        };
        row[target_index] = target;
    }

    if unmapped.is_empty() {
        info!(file = %table.name, "all account codes successfully mapped");
    } else {
        warn!(
            file = %table.name,
            unmapped = ?unmapped,
            "found {} unmapped account codes",
            unmapped.len()
        );
    }

    Ok((mapped, unmapped))
}

/// Flattens per-file unmapped codes into a reconciliation report: one row per
/// (file, code) pair. An empty input yields an empty, correctly-shaped table.
pub fn reconciliation_report(unmapped_by_file: &BTreeMap<String, Vec<String>>) -> Table {
    let mut report = Table::new(
        "reconciliation",
        vec![
            SOURCE_FILE_COLUMN.to_string(),
            "unmapped_account".to_string(),
            "status".to_string(),
        ],
    );

    for (file_name, accounts) in unmapped_by_file {
        for account in accounts {
            report.push_row(vec![
                CellValue::Text(file_name.clone()),
                CellValue::Text(account.clone()),
                CellValue::Text(STATUS_NEEDS_MAPPING.to_string()),
            ]);
        }
    }

    if report.row_count() > 0 {
        info!(
            rows = report.row_count(),
            "created reconciliation report for unmapped accounts"
        );
    }

    report
}

/// Validates a raw mapping configuration without mutating it.
///
/// Flags an empty mapping and entries whose corporate target is null or
/// blank. Multiple department codes sharing one corporate target are valid;
/// they are logged for awareness only.
pub fn validate_mapping(mapping: &BTreeMap<String, Option<String>>) -> Vec<String> {
    let mut issues = Vec::new();

    if mapping.is_empty() {
        issues.push("Mapping configuration is empty".to_string());
        return issues;
    }

    let invalid: Vec<&str> = mapping
        .iter()
        .filter(|(_, target)| match target {
            None => true,
            Some(value) => value.trim().is_empty(),
        })
        .map(|(code, _)| code.as_str())
        .collect();

    if !invalid.is_empty() {
        let examples: Vec<&str> = invalid.iter().take(5).copied().collect();
        issues.push(format!(
            "Found {} invalid mapping values: {}",
            invalid.len(),
            examples.join(", ")
        ));
    }

    let mut reverse: BTreeMap<&str, &str> = BTreeMap::new();
    let mut shared = 0usize;
    for (code, target) in mapping {
        if let Some(target) = target.as_deref().filter(|value| !value.trim().is_empty()) {
            if let Some(existing) = reverse.get(target) {
                shared += 1;
                info!(
                    corporate = target,
                    first = existing,
                    second = code.as_str(),
                    "corporate code has multiple department mappings"
                );
            } else {
                reverse.insert(target, code.as_str());
            }
        }
    }
    if shared > 0 {
        info!(count = shared, "corporate codes with multiple department mappings");
    }

    issues
}

/// Concatenates mapped department tables into one consolidated table.
///
/// Columns are unioned in first-seen order; cells absent from a source table
/// stay empty. Every row is tagged with its originating file name in the
/// trailing [`SOURCE_FILE_COLUMN`].
pub fn merge_tables(tables: &[(String, Table)]) -> Result<Table> {
    if tables.is_empty() {
        return Err(PipelineError::Mapping(
            "no tables provided for consolidation".to_string(),
        ));
    }

    // Union the columns in first-seen order, recording each source column's
    // position in the unioned header as we go.
    let mut columns: Vec<String> = Vec::new();
    let mut positions: Vec<Vec<usize>> = Vec::with_capacity(tables.len());
    for (_, table) in tables {
        let mut indices = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let target = match columns.iter().position(|existing| existing == column) {
                Some(index) => index,
                None => {
                    columns.push(column.clone());
                    columns.len() - 1
                }
            };
            indices.push(target);
        }
        positions.push(indices);
    }
    columns.push(SOURCE_FILE_COLUMN.to_string());

    let mut consolidated = Table::new("consolidated", columns);

    for ((file_name, table), indices) in tables.iter().zip(&positions) {
        for row in &table.rows {
            let mut cells = vec![CellValue::Empty; consolidated.columns.len()];
            for (source_index, target_index) in indices.iter().enumerate() {
                if let Some(cell) = row.get(source_index) {
                    cells[*target_index] = cell.clone();
                }
            }
            let tag_index = consolidated.columns.len() - 1;
            cells[tag_index] = CellValue::Text(file_name.clone());
            consolidated.rows.push(cells);
        }
    }

    info!(
        files = tables.len(),
        records = consolidated.row_count(),
        "consolidated department tables"
    );

    Ok(consolidated)
}
