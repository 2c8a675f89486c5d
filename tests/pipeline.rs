use std::collections::BTreeMap;
use std::path::Path;

use fpa_consolidate::PipelineError;
use fpa_consolidate::consolidate::{ConsolidationOptions, consolidate_departments};
use fpa_consolidate::io::excel_read;
use fpa_consolidate::mapping::AccountMapping;
use fpa_consolidate::model::CellValue;
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

enum Cell {
    Text(&'static str),
    Number(f64),
}

fn write_fixture(path: &Path, columns: &[&str], rows: &[Vec<Cell>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col_idx, header) in columns.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *header)
            .expect("header written");
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => worksheet
                    .write_string((row_idx + 1) as u32, col_idx as u16, *value)
                    .expect("cell written"),
                Cell::Number(value) => worksheet
                    .write_number((row_idx + 1) as u32, col_idx as u16, *value)
                    .expect("cell written"),
            };
        }
    }

    workbook.save(path).expect("fixture saved");
}

fn sales_mapping() -> AccountMapping {
    let mut mapping = BTreeMap::new();
    mapping.insert("SALES001".to_string(), "4000".to_string());
    mapping.insert("SALES002".to_string(), "4100".to_string());
    mapping.insert("MKT001".to_string(), "6000".to_string());
    mapping
}

fn required_columns() -> Vec<String> {
    vec!["account_code".to_string(), "amount".to_string()]
}

#[test]
fn consolidates_two_valid_departments() {
    let temp_dir = tempdir().expect("temporary directory");
    write_fixture(
        &temp_dir.path().join("marketing.xlsx"),
        &["account_code", "amount"],
        &[vec![Cell::Text("MKT001"), Cell::Number(50.25)]],
    );
    write_fixture(
        &temp_dir.path().join("sales.xlsx"),
        &["account_code", "amount"],
        &[
            vec![Cell::Text("SALES001"), Cell::Number(100.50)],
            vec![Cell::Text("SALES002"), Cell::Number(200.75)],
        ],
    );

    let options = ConsolidationOptions::new(temp_dir.path(), sales_mapping(), required_columns());
    let outcome = consolidate_departments(&options).expect("consolidation succeeded");

    let metadata = &outcome.metadata;
    assert!(metadata.success);
    assert_eq!(metadata.file_count, 2);
    assert_eq!(metadata.total_records, 3);
    assert_eq!(metadata.unmapped_count, 0);
    assert_eq!(metadata.records_per_file.get("sales.xlsx"), Some(&2));
    assert!(metadata.validation_issues.is_empty());
    assert!(outcome.reconciliation.is_none());

    // Every row carries its originating file name.
    let consolidated = &outcome.consolidated;
    let tag_index = consolidated
        .column_index("source_file")
        .expect("source_file column present");
    let tags: Vec<String> = consolidated
        .rows
        .iter()
        .map(|row| row[tag_index].display())
        .collect();
    assert_eq!(tags, vec!["marketing.xlsx", "sales.xlsx", "sales.xlsx"]);

    // Amounts were promoted to exact decimals before merging.
    let amount_index = consolidated
        .column_index("amount")
        .expect("amount column present");
    assert_eq!(
        consolidated.rows[0][amount_index],
        CellValue::Decimal("50.25".parse().expect("decimal literal"))
    );
}

#[test]
fn invalid_file_is_skipped_and_recorded() {
    let temp_dir = tempdir().expect("temporary directory");
    write_fixture(
        &temp_dir.path().join("broken.xlsx"),
        &["account_name", "amount"],
        &[vec![Cell::Text("Rent"), Cell::Number(10.0)]],
    );
    write_fixture(
        &temp_dir.path().join("sales.xlsx"),
        &["account_code", "amount"],
        &[
            vec![Cell::Text("SALES001"), Cell::Number(1.0)],
            vec![Cell::Text("SALES001"), Cell::Number(2.0)],
            vec![Cell::Text("SALES002"), Cell::Number(3.0)],
        ],
    );

    let options = ConsolidationOptions::new(temp_dir.path(), sales_mapping(), required_columns());
    let outcome = consolidate_departments(&options).expect("run completes despite skipped file");

    let metadata = &outcome.metadata;
    assert!(metadata.success);
    assert_eq!(metadata.file_count, 2);
    assert_eq!(metadata.total_records, 3);
    assert_eq!(metadata.unmapped_count, 0);

    let issues = metadata
        .validation_issues
        .get("broken.xlsx")
        .expect("issues recorded for skipped file");
    assert!(issues[0].contains("Missing required columns"));
    assert!(!metadata.records_per_file.contains_key("broken.xlsx"));
}

#[test]
fn unmapped_account_produces_reconciliation_row() {
    let temp_dir = tempdir().expect("temporary directory");
    write_fixture(
        &temp_dir.path().join("ops.xlsx"),
        &["account_code", "amount"],
        &[
            vec![Cell::Text("SALES001"), Cell::Number(5.0)],
            vec![Cell::Text("OPS999"), Cell::Number(7.0)],
        ],
    );

    let options = ConsolidationOptions::new(temp_dir.path(), sales_mapping(), required_columns());
    let outcome = consolidate_departments(&options).expect("consolidation succeeded");

    assert_eq!(outcome.metadata.unmapped_count, 1);
    assert_eq!(
        outcome.metadata.unmapped_accounts_by_file.get("ops.xlsx"),
        Some(&vec!["OPS999".to_string()])
    );

    let report = outcome.reconciliation.expect("reconciliation report built");
    assert_eq!(report.row_count(), 1);
    assert_eq!(report.rows[0][0], CellValue::Text("ops.xlsx".to_string()));
    assert_eq!(report.rows[0][1], CellValue::Text("OPS999".to_string()));
    assert_eq!(
        report.rows[0][2],
        CellValue::Text("Needs Mapping".to_string())
    );
}

#[test]
fn empty_folder_fails_before_validation() {
    let temp_dir = tempdir().expect("temporary directory");
    let options = ConsolidationOptions::new(temp_dir.path(), sales_mapping(), required_columns());

    let error = consolidate_departments(&options).expect_err("run fails");
    match error {
        PipelineError::Consolidation { source, metadata } => {
            assert!(matches!(*source, PipelineError::NoSourceFiles(_)));
            assert!(!metadata.success);
            assert!(metadata.error.is_some());
            assert!(metadata.validation_issues.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn all_files_invalid_fails_with_recorded_issues() {
    let temp_dir = tempdir().expect("temporary directory");
    write_fixture(
        &temp_dir.path().join("empty.xlsx"),
        &["account_code", "amount"],
        &[],
    );
    write_fixture(
        &temp_dir.path().join("headless.xlsx"),
        &["description"],
        &[vec![Cell::Text("no accounts here")]],
    );

    let options = ConsolidationOptions::new(temp_dir.path(), sales_mapping(), required_columns());

    let error = consolidate_departments(&options).expect_err("run fails");
    match error {
        PipelineError::Consolidation { source, metadata } => {
            assert!(matches!(*source, PipelineError::NoValidFiles));
            assert_eq!(metadata.file_count, 2);
            assert!(metadata.validation_issues.contains_key("empty.xlsx"));
            assert!(metadata.validation_issues.contains_key("headless.xlsx"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_folder_fails_fast() {
    let temp_dir = tempdir().expect("temporary directory");
    let missing = temp_dir.path().join("does-not-exist");
    let options = ConsolidationOptions::new(&missing, sales_mapping(), required_columns());

    let error = consolidate_departments(&options).expect_err("run fails");
    match error {
        PipelineError::Consolidation { source, .. } => {
            assert!(matches!(*source, PipelineError::MissingFolder(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn output_workbook_is_written_and_readable() {
    let temp_dir = tempdir().expect("temporary directory");
    write_fixture(
        &temp_dir.path().join("sales.xlsx"),
        &["account_code", "amount"],
        &[
            vec![Cell::Text("SALES001"), Cell::Number(0.1)],
            vec![Cell::Text("SALES002"), Cell::Number(0.2)],
        ],
    );

    let output = temp_dir.path().join("out").join("consolidated.xlsx");
    let options = ConsolidationOptions::new(temp_dir.path(), sales_mapping(), required_columns())
        .with_output(&output);

    let outcome = consolidate_departments(&options).expect("consolidation succeeded");
    assert_eq!(outcome.metadata.output_file.as_deref(), Some(output.as_path()));
    assert!(output.exists());

    let written = excel_read::read_table(&output).expect("output readable");
    assert_eq!(written.row_count(), 2);
    assert!(written.column_index("source_file").is_some());
    assert!(written.column_index("corporate_account").is_some());

    // Decimal cells round-trip as exact decimal strings, not floats.
    let amount_index = written.column_index("amount").expect("amount column");
    assert_eq!(written.rows[0][amount_index], CellValue::Text("0.1".to_string()));
}
