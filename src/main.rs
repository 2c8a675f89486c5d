use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fpa_consolidate::audit::init_logging;
use fpa_consolidate::config::{load_account_mapping, load_pipeline_config, load_raw_mapping};
use fpa_consolidate::consolidate::{ConsolidationOptions, consolidate_departments};
use fpa_consolidate::mapping::validate_mapping;
use fpa_consolidate::validate::validate_file;
use fpa_consolidate::{PipelineError, Result};

fn main() {
    if let Err(error) = init_logging() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Consolidate(args) => execute_consolidate(args),
        Command::Validate(args) => execute_validate(args),
        Command::CheckMapping(args) => execute_check_mapping(args),
    }
}

fn execute_consolidate(args: ConsolidateArgs) -> Result<()> {
    let config = load_pipeline_config(&args.config)?;
    let mapping = load_account_mapping(&args.mapping)?;

    let mut options = ConsolidationOptions::new(args.input, mapping, config.required_columns);
    if let Some(output) = args.output {
        options = options.with_output(output);
    }

    let outcome = consolidate_departments(&options)?;
    let metadata = &outcome.metadata;
    println!(
        "consolidated {} records from {} of {} files ({} unmapped accounts)",
        metadata.total_records,
        metadata.files_processed(),
        metadata.file_count,
        metadata.unmapped_count,
    );

    if let Some(report) = &outcome.reconciliation {
        for row in &report.rows {
            let cells: Vec<String> = row.iter().map(|cell| cell.display()).collect();
            println!("needs mapping: {}", cells.join(" / "));
        }
    }

    Ok(())
}

fn execute_validate(args: ValidateArgs) -> Result<()> {
    let config = load_pipeline_config(&args.config)?;
    let (is_valid, issues) = validate_file(&args.input, &config.required_columns)?;

    if is_valid {
        println!("{}: valid", args.input.display());
        return Ok(());
    }

    for issue in &issues {
        println!("{}: {issue}", args.input.display());
    }
    Err(PipelineError::InvalidWorkbook(format!(
        "{} failed validation with {} issue(s)",
        args.input.display(),
        issues.len()
    )))
}

fn execute_check_mapping(args: CheckMappingArgs) -> Result<()> {
    let raw = load_raw_mapping(&args.mapping)?;
    let issues = validate_mapping(&raw);

    if issues.is_empty() {
        println!("{}: {} mapping entries, no issues", args.mapping.display(), raw.len());
        return Ok(());
    }

    for issue in &issues {
        println!("{}: {issue}", args.mapping.display());
    }
    Err(PipelineError::Mapping(format!(
        "{} has {} issue(s)",
        args.mapping.display(),
        issues.len()
    )))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate department ledgers into a corporate chart of accounts."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consolidate all department files in a folder.
    Consolidate(ConsolidateArgs),
    /// Validate the structure of a single department file.
    Validate(ValidateArgs),
    /// Check an account mapping configuration for issues.
    CheckMapping(CheckMappingArgs),
}

#[derive(clap::Args)]
struct ConsolidateArgs {
    /// Folder containing department spreadsheet files.
    #[arg(long)]
    input: PathBuf,

    /// YAML file with the account_mapping dictionary.
    #[arg(long)]
    mapping: PathBuf,

    /// YAML pipeline configuration (required columns, thresholds, rules).
    #[arg(long)]
    config: PathBuf,

    /// Optional path for the consolidated workbook.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Department spreadsheet file to validate.
    #[arg(long)]
    input: PathBuf,

    /// YAML pipeline configuration supplying the required columns.
    #[arg(long)]
    config: PathBuf,
}

#[derive(clap::Args)]
struct CheckMappingArgs {
    /// YAML file with the account_mapping dictionary.
    #[arg(long)]
    mapping: PathBuf,
}
