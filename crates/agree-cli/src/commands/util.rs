//! Shared utilities for CLI commands.

use std::path::{Path, PathBuf};

use agree_core::Dataset;
use anyhow::{Context, Result};

use crate::Config;

/// Picks the explicit input path, falling back to the configured one.
pub fn resolve_input(input: Option<&Path>, config: &Config) -> PathBuf {
    input.map_or_else(|| config.input_path.clone(), Path::to_path_buf)
}

/// Reads and normalizes the merged annotations file.
///
/// A missing file is reported before anything is computed, so callers never
/// emit a partial report.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        anyhow::bail!("input file not found: {}", path.display());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let dataset = Dataset::from_json_str(&json)
        .with_context(|| format!("{} is not a mapping of item ids to records", path.display()))?;

    let stats = dataset.stats();
    tracing::debug!(
        path = %path.display(),
        items = stats.items,
        entries = stats.entries,
        dropped = stats.dropped,
        "loaded dataset"
    );
    Ok(dataset)
}

/// Share of `part` in `total` as a percentage, 0 when `total` is 0.
#[allow(clippy::cast_precision_loss)]
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_dataset_reports_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.json");
        let err = load_dataset(&path).unwrap_err();
        assert!(err.to_string().starts_with("input file not found:"));
    }

    #[test]
    fn load_dataset_rejects_wrong_shape() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(err.to_string().contains("is not a mapping"));
    }

    #[test]
    fn resolve_input_prefers_explicit_path() {
        let config = Config::default();
        assert_eq!(
            resolve_input(Some(Path::new("x.json")), &config),
            PathBuf::from("x.json")
        );
        assert_eq!(resolve_input(None, &config), config.input_path);
    }

    #[test]
    fn percent_of_zero_total() {
        assert!(percent(3, 0).abs() < f64::EPSILON);
        assert!((percent(1, 4) - 25.0).abs() < f64::EPSILON);
    }
}
