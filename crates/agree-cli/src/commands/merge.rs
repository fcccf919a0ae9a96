//! Merge command: group per-annotator record exports by item.

use std::io::Write;
use std::path::{Path, PathBuf};

use agree_core::{MergeOptions, MergeOutcome, SourceRecords, merge_sources};
use anyhow::{Context, Result};
use serde_json::Value;

/// Reads one export: a JSON list of records.
fn read_source(path: &Path) -> Result<SourceRecords> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<Value> = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a list of records", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    tracing::debug!(source = %name, records = records.len(), "read source");
    Ok(SourceRecords { name, records })
}

/// Reads every input and merges them.
pub fn merge_files(inputs: &[PathBuf], options: &MergeOptions) -> Result<MergeOutcome> {
    let sources = inputs
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(merge_sources(sources, options))
}

/// Runs the merge command.
///
/// The merged mapping goes to `output` when given, otherwise to `writer`.
pub fn run<W: Write>(
    writer: &mut W,
    inputs: &[PathBuf],
    output: Option<&Path>,
    options: &MergeOptions,
) -> Result<()> {
    let outcome = merge_files(inputs, options)?;
    let json = serde_json::to_string_pretty(&outcome.items)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(
                writer,
                "Saved merged data for {} items to {}",
                outcome.items.len(),
                path.display()
            )?;
        }
        None => writeln!(writer, "{json}")?,
    }
    Ok(())
}
