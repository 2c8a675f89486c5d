use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{PipelineError, Result};

/// File extensions recognised as department spreadsheets.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Lists the spreadsheet files in a folder in deterministic (sorted) order.
pub fn discover_spreadsheets(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(PipelineError::MissingFolder(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(PipelineError::NotADirectory(folder.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_spreadsheet_extension(path))
        .collect();

    files.sort();
    Ok(files)
}

fn has_spreadsheet_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

/// Validates that a path exists and is a regular file.
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(PipelineError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

/// Creates the parent directory of an output file when it is missing.
pub fn ensure_output_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Builds a timestamped output filename such as
/// `variance_analysis_2025-11-08_143022.xlsx`.
pub fn timestamped_filename(base: &str, extension: &str, output_dir: Option<&Path>) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
    let filename = format!("{base}_{timestamp}.{extension}");

    match output_dir {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename),
    }
}
