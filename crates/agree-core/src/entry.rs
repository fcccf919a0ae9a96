//! Annotation entries and the normalized per-item dataset.
//!
//! Raw records arrive as loosely typed JSON objects. Normalization turns each
//! one into an [`Entry`] or drops it: a record that has no annotator, has
//! non-numeric timestamps, or does not satisfy `end > start` never reaches the
//! sweep or the classifier. Dropping is local to the record and never fails
//! the item or the run.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{AnnotatorId, ItemId, canonical_scalar};

/// Record keys accepted as the annotator column, in lookup order.
const ANNOTATOR_KEYS: &[&str] = &["completed_by", "annotator_id", "annotator"];

/// Reasons a raw record is excluded from analysis.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EntryError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record has no annotator")]
    MissingAnnotator,
    #[error("record has no {field}")]
    MissingField { field: &'static str },
    #[error("{field} is not numeric: {value}")]
    NonNumeric { field: &'static str, value: String },
    #[error("non-positive duration: start {start}, end {end}")]
    NonPositiveDuration { start: f64, end: f64 },
}

/// One annotator's labeled interval on one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Interval start in seconds.
    pub start: f64,
    /// Interval end in seconds. Always greater than `start`.
    pub end: f64,
    /// Who drew the interval.
    pub annotator: AnnotatorId,
    /// External identifier carried through from the source record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Entry {
    /// Creates an entry, enforcing `end > start`.
    pub fn new(annotator: AnnotatorId, start: f64, end: f64) -> Result<Self, EntryError> {
        if end.partial_cmp(&start) != Some(Ordering::Greater) {
            return Err(EntryError::NonPositiveDuration { start, end });
        }
        Ok(Self {
            start,
            end,
            annotator,
            id: None,
        })
    }

    /// Attaches an external identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Strict temporal overlap. Intervals that only touch do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Normalizes a raw JSON record.
    pub fn from_record(record: &Value) -> Result<Self, EntryError> {
        let Value::Object(map) = record else {
            return Err(EntryError::NotAnObject);
        };

        let annotator = ANNOTATOR_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(AnnotatorId::from_scalar)
            .ok_or(EntryError::MissingAnnotator)?;
        let start = numeric_field(map, "start")?;
        let end = numeric_field(map, "end")?;

        let mut entry = Self::new(annotator, start, end)?;
        entry.id = map.get("id").and_then(canonical_scalar);
        Ok(entry)
    }
}

/// Reads a field as a finite float, accepting numbers and numeric strings.
fn numeric_field(map: &Map<String, Value>, field: &'static str) -> Result<f64, EntryError> {
    let value = match map.get(field) {
        None | Some(Value::Null) => return Err(EntryError::MissingField { field }),
        Some(value) => value,
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| EntryError::NonNumeric {
            field,
            value: value.to_string(),
        })
}

/// Counters describing what normalization kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Items that survived with at least one valid entry.
    pub items: usize,
    /// Raw records seen across all items.
    pub records: usize,
    /// Records that became entries.
    pub entries: usize,
    /// Records excluded as malformed.
    pub dropped: usize,
}

/// Normalized input: valid entries grouped by item.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    items: BTreeMap<ItemId, Vec<Entry>>,
    stats: NormalizeStats,
}

impl Dataset {
    /// Builds a dataset from already-normalized entries.
    pub fn from_entries(items: impl IntoIterator<Item = (ItemId, Vec<Entry>)>) -> Self {
        let mut dataset = Self::default();
        for (item, entries) in items {
            dataset.stats.records += entries.len();
            dataset.stats.entries += entries.len();
            if entries.is_empty() {
                continue;
            }
            dataset.items.entry(item).or_default().extend(entries);
        }
        dataset.stats.items = dataset.items.len();
        dataset
    }

    /// Normalizes the raw item mapping produced by ingestion.
    ///
    /// Never fails: malformed records and items with an empty key are dropped
    /// and counted.
    pub fn from_raw(raw: BTreeMap<String, Vec<Value>>) -> Self {
        let mut items = BTreeMap::new();
        let mut stats = NormalizeStats::default();

        for (key, records) in raw {
            stats.records += records.len();
            let Ok(item) = ItemId::new(key) else {
                tracing::debug!(records = records.len(), "dropping item with empty id");
                stats.dropped += records.len();
                continue;
            };

            let mut entries = Vec::with_capacity(records.len());
            for (index, record) in records.iter().enumerate() {
                match Entry::from_record(record) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        tracing::debug!(item = %item, index, error = %e, "dropping record");
                        stats.dropped += 1;
                    }
                }
            }

            stats.entries += entries.len();
            if !entries.is_empty() {
                items.insert(item, entries);
            }
        }

        stats.items = items.len();
        tracing::debug!(
            items = stats.items,
            entries = stats.entries,
            dropped = stats.dropped,
            "normalized dataset"
        );
        Self { items, stats }
    }

    /// Parses the item mapping from JSON and normalizes it.
    ///
    /// Fails only when the document is not a mapping of item ids to lists.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Vec<Value>> = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Iterates items in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &[Entry])> {
        self.items.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn get(&self, item: &str) -> Option<&[Entry]> {
        self.items.get(item).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn stats(&self) -> NormalizeStats {
        self.stats
    }

    pub(crate) fn items_vec(&self) -> Vec<(&ItemId, &[Entry])> {
        self.iter().collect()
    }
}
