use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::io::files::validate_file_exists;
use crate::mapping::{AccountMapping, validate_mapping};

/// Pipeline configuration loaded once at process start.
///
/// Fields are typed and validated at load time; missing fields fail fast with
/// serde's enumerated missing-field errors instead of deferred lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Column names every department file must carry.
    pub required_columns: Vec<String>,
    /// Variance thresholds consumed by downstream analysis.
    pub variance_thresholds: VarianceThresholds,
    /// Favorability rules per account type, e.g. `revenue: actual_gt_budget`.
    pub favorability_rules: BTreeMap<String, String>,
}

/// Variance thresholds kept as exact decimals, never floats.
#[derive(Debug, Clone, Deserialize)]
pub struct VarianceThresholds {
    pub percentage: Decimal,
    pub absolute: Decimal,
}

#[derive(Debug, Deserialize)]
struct MappingFile {
    // Targets stay optional here so null entries survive parsing and can be
    // reported by the mapping validator.
    account_mapping: BTreeMap<String, Option<String>>,
}

/// Loads and validates the pipeline configuration from a YAML file.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    let config: PipelineConfig = load_yaml(path)?;

    if config.required_columns.is_empty() {
        return Err(PipelineError::Config(format!(
            "required_columns is empty in {}",
            path.display()
        )));
    }

    Ok(config)
}

/// Loads the account mapping from a YAML file with an `account_mapping` map.
///
/// The raw mapping is validated before use; null or blank corporate targets
/// and an empty mapping fail the load. When a department code is repeated in
/// the file the last entry wins (YAML map semantics).
pub fn load_account_mapping(path: &Path) -> Result<AccountMapping> {
    let raw = load_raw_mapping(path)?;

    let issues = validate_mapping(&raw);
    if !issues.is_empty() {
        return Err(PipelineError::Mapping(format!(
            "invalid mapping in {}: {}",
            path.display(),
            issues.join("; ")
        )));
    }

    Ok(raw
        .into_iter()
        .filter_map(|(code, target)| target.map(|target| (code, target)))
        .collect())
}

/// Loads the raw, unvalidated mapping for inspection (CLI `check-mapping`).
pub fn load_raw_mapping(path: &Path) -> Result<BTreeMap<String, Option<String>>> {
    let file: MappingFile = load_yaml(path)?;
    Ok(file.account_mapping)
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    validate_file_exists(path)?;
    let source = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&source)
        .map_err(|error| PipelineError::Config(format!("{}: {error}", path.display())))
}
