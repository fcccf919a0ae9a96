//! Per-segment support classification and split detection.
//!
//! For every segment, each other roster member that has at least one strictly
//! overlapping segment on the same item counts as one unit of support. A
//! segment that overlaps two or more segments of a single other annotator is
//! a split: one continuous span on this side, fragments on the other.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::Serialize;

use crate::entry::{Dataset, Entry};
use crate::roster::Roster;
use crate::types::{AnnotatorId, ItemId};

/// How much corroboration a segment received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    /// No other annotator overlaps the segment.
    Isolated,
    /// Some, but not all, other annotators overlap it.
    Partial,
    /// As many annotators overlap it as a roster member has peers.
    Full,
}

impl SupportLevel {
    /// Classifies `count` supporting annotators out of `possible`.
    pub const fn from_support(count: usize, possible: usize) -> Self {
        if count == 0 {
            Self::Isolated
        } else if count >= possible {
            Self::Full
        } else {
            Self::Partial
        }
    }
}

/// Classification of a single segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentClassification {
    pub item: ItemId,
    pub annotator: AnnotatorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    pub start: f64,
    pub end: f64,
    /// Other annotators with at least one overlapping segment.
    pub supported_by: Vec<AnnotatorId>,
    /// Other annotators with two or more overlapping segments.
    pub split_against: Vec<AnnotatorId>,
    pub level: SupportLevel,
}

impl SegmentClassification {
    pub fn support_count(&self) -> usize {
        self.supported_by.len()
    }

    pub fn is_split(&self) -> bool {
        !self.split_against.is_empty()
    }
}

/// Aggregate counters over classified segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationSummary {
    pub total: usize,
    pub isolated: usize,
    pub partial: usize,
    pub full: usize,
    /// Segments split against at least one other annotator, counted once each.
    pub split_cases: usize,
}

impl ClassificationSummary {
    pub fn record(&mut self, segment: &SegmentClassification) {
        self.total += 1;
        match segment.level {
            SupportLevel::Isolated => self.isolated += 1,
            SupportLevel::Partial => self.partial += 1,
            SupportLevel::Full => self.full += 1,
        }
        if !segment.split_against.is_empty() {
            self.split_cases += 1;
        }
    }

    pub const fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.isolated += other.isolated;
        self.partial += other.partial;
        self.full += other.full;
        self.split_cases += other.split_cases;
    }

    /// Fraction of segments that are split cases, 0 when nothing was checked.
    #[allow(clippy::cast_precision_loss)]
    pub fn split_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.split_cases as f64 / self.total as f64
        }
    }

    /// Every segment lands in exactly one support level.
    pub const fn is_partition(&self) -> bool {
        self.isolated + self.partial + self.full == self.total
    }
}

/// Classification result for one item.
#[derive(Debug, Clone, Default)]
pub struct ItemClassification {
    pub segments: Vec<SegmentClassification>,
    pub summary: ClassificationSummary,
    pub annotators_seen: BTreeSet<AnnotatorId>,
}

/// Classification result for a whole dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationReport {
    pub segments: Vec<SegmentClassification>,
    pub summary: ClassificationSummary,
    /// Every annotator ID observed in valid entries.
    pub annotators_seen: BTreeSet<AnnotatorId>,
    /// Observed annotators outside the roster. Their segments are classified
    /// but they never count as support for others.
    pub unrostered: BTreeSet<AnnotatorId>,
}

/// Classifies every segment of one item against the roster.
pub fn classify_item(item: &ItemId, entries: &[Entry], roster: &Roster) -> ItemClassification {
    let mut by_annotator: BTreeMap<&AnnotatorId, Vec<&Entry>> = BTreeMap::new();
    for entry in entries {
        by_annotator.entry(&entry.annotator).or_default().push(entry);
    }

    let mut result = ItemClassification {
        annotators_seen: by_annotator.keys().map(|&id| id.clone()).collect(),
        ..ItemClassification::default()
    };

    // Peers of a roster member; an owner outside the roster is held to the same bar.
    let possible = roster.len().saturating_sub(1);

    for (&owner, segments) in &by_annotator {
        for &segment in segments {
            let mut supported_by = Vec::new();
            let mut split_against = Vec::new();

            for other in roster.others(owner) {
                let Some(candidates) = by_annotator.get(other) else {
                    continue;
                };
                let overlapping = candidates.iter().filter(|c| segment.overlaps(c)).count();
                if overlapping >= 1 {
                    supported_by.push(other.clone());
                }
                if overlapping >= 2 {
                    split_against.push(other.clone());
                }
            }

            let classified = SegmentClassification {
                item: item.clone(),
                annotator: owner.clone(),
                segment_id: segment.id.clone(),
                start: segment.start,
                end: segment.end,
                level: SupportLevel::from_support(supported_by.len(), possible),
                supported_by,
                split_against,
            };
            result.summary.record(&classified);
            result.segments.push(classified);
        }
    }

    result
}

/// Classifies every item of the dataset.
///
/// Items run in parallel and are merged in item order.
pub fn classify(dataset: &Dataset, roster: &Roster) -> ClassificationReport {
    let per_item: Vec<ItemClassification> = dataset
        .items_vec()
        .par_iter()
        .map(|(item, entries)| classify_item(item, entries, roster))
        .collect();

    let mut report = ClassificationReport::default();
    for item in per_item {
        report.summary.merge(&item.summary);
        report.segments.extend(item.segments);
        report.annotators_seen.extend(item.annotators_seen);
    }

    report.unrostered = report
        .annotators_seen
        .iter()
        .filter(|id| !roster.contains(id))
        .cloned()
        .collect();
    for id in &report.unrostered {
        tracing::warn!(annotator = %id, "annotator is not in the roster and never counts as support");
    }

    tracing::debug!(
        segments = report.summary.total,
        split_cases = report.summary.split_cases,
        "classified segments"
    );
    report
}
