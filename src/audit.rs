use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{PipelineError, Result};

/// Structured audit record capturing who/what/when for one processing run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub operation: String,
    pub source_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    pub records_processed: usize,
    pub files_processed: usize,
    pub unmapped_accounts: usize,
}

impl AuditEntry {
    /// Builds an entry stamped with the current time and the invoking user
    /// (the `USER` environment variable, `unknown` when unset).
    pub fn new(
        operation: impl Into<String>,
        source_files: &[PathBuf],
        output_file: Option<&Path>,
        records_processed: usize,
        files_processed: usize,
        unmapped_accounts: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            operation: operation.into(),
            source_files: source_files.to_vec(),
            output_file: output_file.map(Path::to_path_buf),
            records_processed,
            files_processed,
            unmapped_accounts,
        }
    }

    /// Appends the entry to the audit log sink as one structured event.
    pub fn emit(&self) -> Result<()> {
        let payload = serde_json::to_string(self)?;
        info!(
            target: "audit",
            operation = %self.operation,
            user = %self.user,
            entry = %payload,
            "audit trail entry"
        );
        Ok(())
    }
}

/// Initialises the tracing subscriber used by the CLI. Respects `RUST_LOG`,
/// defaulting to `info`.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| PipelineError::Logging(error.to_string()))
}
