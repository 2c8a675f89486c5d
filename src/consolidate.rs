use std::path::{Path, PathBuf};

use tracing::{error, info, instrument, warn};

use crate::amounts::convert_amounts;
use crate::audit::AuditEntry;
use crate::error::{PipelineError, Result};
use crate::io::excel_read;
use crate::io::excel_write;
use crate::io::files::{discover_spreadsheets, ensure_output_directory};
use crate::mapping::{AccountMapping, map_account_codes, merge_tables, reconciliation_report};
use crate::model::{RunMetadata, Table};
use crate::validate::validate_table;

/// Default column holding department account codes.
pub const DEFAULT_SOURCE_COLUMN: &str = "account_code";
/// Default column populated with corporate account codes.
pub const DEFAULT_TARGET_COLUMN: &str = "corporate_account";

/// Inputs for one consolidation run.
#[derive(Debug, Clone)]
pub struct ConsolidationOptions {
    /// Folder containing the department spreadsheet files.
    pub input_folder: PathBuf,
    /// Department code → corporate code mapping.
    pub mapping: AccountMapping,
    /// Columns every department file must carry.
    pub required_columns: Vec<String>,
    /// Column holding department account codes.
    pub source_column: String,
    /// Column to populate with corporate account codes.
    pub target_column: String,
    /// Optional path for the consolidated workbook.
    pub output_file: Option<PathBuf>,
}

impl ConsolidationOptions {
    /// Builds options with the default account code column names.
    pub fn new(
        input_folder: impl Into<PathBuf>,
        mapping: AccountMapping,
        required_columns: Vec<String>,
    ) -> Self {
        Self {
            input_folder: input_folder.into(),
            mapping,
            required_columns,
            source_column: DEFAULT_SOURCE_COLUMN.to_string(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            output_file: None,
        }
    }

    /// Sets the output path for the consolidated workbook.
    pub fn with_output(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }
}

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct ConsolidationOutcome {
    /// All department rows concatenated, tagged with their source file.
    pub consolidated: Table,
    /// Reconciliation report, present when any account was unmapped.
    pub reconciliation: Option<Table>,
    /// Finalized run metadata.
    pub metadata: RunMetadata,
}

/// Consolidates all department files in a folder into a single dataset.
///
/// Files failing structural validation are skipped and recorded, not raised;
/// the run fails only when the folder is missing, no spreadsheet file exists,
/// or no file survives validation. Any failure returns
/// [`PipelineError::Consolidation`] wrapping the cause and carrying the
/// best-effort metadata gathered up to that point.
#[instrument(level = "info", skip_all, fields(input = %options.input_folder.display()))]
pub fn consolidate_departments(options: &ConsolidationOptions) -> Result<ConsolidationOutcome> {
    info!("starting consolidation");
    let mut metadata = RunMetadata::begin(&options.input_folder);

    match run_pipeline(options, &mut metadata) {
        Ok((consolidated, reconciliation)) => {
            metadata.finish();

            let audit = AuditEntry::new(
                "department_consolidation",
                &metadata.source_files,
                options.output_file.as_deref(),
                metadata.total_records,
                metadata.files_processed(),
                metadata.unmapped_count,
            );
            audit.emit()?;

            info!(
                files = metadata.files_processed(),
                records = metadata.total_records,
                unmapped = metadata.unmapped_count,
                "consolidation completed successfully"
            );

            Ok(ConsolidationOutcome {
                consolidated,
                reconciliation,
                metadata,
            })
        }
        Err(cause) => {
            metadata.fail(cause.to_string());
            error!(%cause, "consolidation failed");
            Err(PipelineError::Consolidation {
                source: Box::new(cause),
                metadata: Box::new(metadata),
            })
        }
    }
}

fn run_pipeline(
    options: &ConsolidationOptions,
    metadata: &mut RunMetadata,
) -> Result<(Table, Option<Table>)> {
    // Step 1: discover source files.
    let files = discover_spreadsheets(&options.input_folder)?;
    if files.is_empty() {
        return Err(PipelineError::NoSourceFiles(options.input_folder.clone()));
    }
    metadata.file_count = files.len();
    info!(count = files.len(), "found spreadsheet files to consolidate");

    // Step 2: validate and load each file, skipping failures.
    let mut loaded: Vec<(String, Table)> = Vec::new();
    for path in &files {
        let file_name = file_name_of(path);
        info!(file = %file_name, "processing file");

        let table = match excel_read::read_table(path) {
            Ok(table) => table,
            Err(cause) => {
                warn!(file = %file_name, %cause, "failed to load file");
                metadata
                    .validation_issues
                    .insert(file_name, vec![cause.to_string()]);
                continue;
            }
        };

        let (is_valid, issues) = validate_table(&table, &options.required_columns);
        if !is_valid {
            metadata.validation_issues.insert(file_name, issues);
            continue;
        }

        metadata.source_files.push(path.clone());
        metadata
            .records_per_file
            .insert(file_name.clone(), table.row_count());
        info!(file = %file_name, records = table.row_count(), "loaded file");
        loaded.push((file_name, table));
    }

    // Step 3: abort when nothing survived validation.
    if loaded.is_empty() {
        return Err(PipelineError::NoValidFiles);
    }

    // Step 4: map account codes and accumulate unmapped codes per file.
    let mut mapped: Vec<(String, Table)> = Vec::new();
    for (file_name, table) in &loaded {
        let (mapped_table, unmapped) = map_account_codes(
            table,
            &options.mapping,
            &options.source_column,
            &options.target_column,
        )?;
        if !unmapped.is_empty() {
            metadata
                .unmapped_accounts_by_file
                .insert(file_name.clone(), unmapped);
        }
        mapped.push((file_name.clone(), mapped_table));
    }

    // Step 5: exact decimals before any precision-sensitive arithmetic.
    for (_, table) in &mut mapped {
        *table = convert_amounts(table, None);
    }

    // Step 6: merge with source tagging.
    let consolidated = merge_tables(&mapped)?;
    metadata.total_records = consolidated.row_count();

    // Step 7: reconciliation report for unmapped accounts.
    let reconciliation = if metadata.unmapped_accounts_by_file.is_empty() {
        metadata.unmapped_count = 0;
        info!("consolidation complete - all accounts mapped");
        None
    } else {
        let report = reconciliation_report(&metadata.unmapped_accounts_by_file);
        metadata.unmapped_count = report.row_count();
        warn!(
            unmapped = metadata.unmapped_count,
            "consolidation complete with unmapped accounts"
        );
        Some(report)
    };

    // Step 8: persist when an output path was supplied.
    if let Some(output_file) = &options.output_file {
        ensure_output_directory(output_file)?;
        excel_write::write_table(output_file, &consolidated)?;
        metadata.output_file = Some(output_file.clone());
        info!(output = %output_file.display(), "consolidated data saved");
    }

    Ok((consolidated, reconciliation))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
