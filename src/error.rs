use std::path::PathBuf;

use thiserror::Error;

use crate::model::RunMetadata;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type covering the different failure cases that can occur while the
/// pipeline discovers, validates, maps, and consolidates department files.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when JSON serialization of metadata or audit entries fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the input folder does not exist.
    #[error("folder not found: {0}")]
    MissingFolder(PathBuf),

    /// Raised when the input folder path points at a file.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Raised when a named source file does not exist.
    #[error("file not found: {0}")]
    MissingFile(PathBuf),

    /// Raised when a source path points at a directory.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a configuration file cannot be parsed, is missing fields,
    /// or has invalid values. Parse failures keep the offending path in the
    /// message.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Raised when account mapping cannot be applied, e.g. the source column
    /// is absent or the mapping configuration is unusable.
    #[error("account mapping error: {0}")]
    Mapping(String),

    /// Raised when the input folder contains no spreadsheet files.
    #[error("no spreadsheet files found in folder: {0}")]
    NoSourceFiles(PathBuf),

    /// Raised when every discovered file failed structural validation.
    #[error("no valid files to consolidate; check validation_issues in run metadata")]
    NoValidFiles,

    /// Wraps any failure during orchestration together with the best-effort
    /// metadata snapshot gathered before the failure.
    #[error("consolidation failed: {source}")]
    Consolidation {
        #[source]
        source: Box<PipelineError>,
        metadata: Box<RunMetadata>,
    },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
