//! Merging per-annotator record exports into the per-item mapping.
//!
//! Each source is a list of flat records exported from one annotation sheet.
//! The item column goes by several names depending on who built the sheet, so
//! known aliases are renamed to `id` first. Item IDs are normalized to strings
//! with a trailing `.0` removed, since numeric columns come out as floats.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::types::canonical_scalar;

/// Column holding the item identifier after renaming.
pub const ID_COLUMN: &str = "id";

/// Field recording which source a merged record came from.
pub const SOURCE_FIELD: &str = "_source_file";

/// Options for [`merge_sources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Column names renamed to `id` before grouping.
    pub id_aliases: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            id_aliases: vec!["Unnamed: 1".into(), "l录音".into(), "录音".into()],
        }
    }
}

/// Records loaded from one export.
#[derive(Debug, Clone)]
pub struct SourceRecords {
    /// File name, recorded on every merged record.
    pub name: String,
    pub records: Vec<Value>,
}

/// Result of merging sources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOutcome {
    /// Records grouped by normalized item ID.
    pub items: BTreeMap<String, Vec<Value>>,
    /// Sources with no recognizable ID column.
    pub skipped_sources: Vec<String>,
    /// Records dropped because their ID was empty.
    pub records_without_id: usize,
}

/// Normalizes an item ID cell: scalar to string, trailing `.0` removed.
pub fn normalize_item_id(value: &Value) -> Option<String> {
    let mut id = match value {
        // Keep the float spelling so `101.0` and `"101.0"` normalize alike.
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| format!("{f:?}"))?,
        other => canonical_scalar(other)?,
    };
    if let Some(len) = id.strip_suffix(".0").map(str::len) {
        id.truncate(len);
    }
    if id.is_empty() { None } else { Some(id) }
}

/// Renames the first alias column present in `record` to `id`.
fn rename_id_column(record: &mut serde_json::Map<String, Value>, aliases: &[String]) {
    if record.contains_key(ID_COLUMN) {
        return;
    }
    for alias in aliases {
        if let Some(value) = record.remove(alias) {
            record.insert(ID_COLUMN.to_string(), value);
            return;
        }
    }
}

/// Groups the records of every source by item ID.
pub fn merge_sources(sources: Vec<SourceRecords>, options: &MergeOptions) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for source in sources {
        let mut records: Vec<serde_json::Map<String, Value>> = source
            .records
            .into_iter()
            .filter_map(|record| match record {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        for record in &mut records {
            rename_id_column(record, &options.id_aliases);
        }

        if !records.iter().any(|r| r.contains_key(ID_COLUMN)) {
            let columns: Vec<&String> = records
                .first()
                .map(|r| r.keys().collect())
                .unwrap_or_default();
            tracing::warn!(source = %source.name, ?columns, "no id column found, skipping source");
            outcome.skipped_sources.push(source.name);
            continue;
        }

        let mut merged = 0_usize;
        for mut record in records {
            let Some(id) = record.get(ID_COLUMN).and_then(normalize_item_id) else {
                outcome.records_without_id += 1;
                continue;
            };
            record.insert(ID_COLUMN.to_string(), Value::String(id.clone()));
            record.insert(SOURCE_FIELD.to_string(), Value::String(source.name.clone()));
            outcome.items.entry(id).or_default().push(Value::Object(record));
            merged += 1;
        }
        tracing::debug!(source = %source.name, merged, "merged source");
    }

    outcome
}
