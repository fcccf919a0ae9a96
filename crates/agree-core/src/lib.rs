//! Core logic for measuring inter-annotator agreement on time spans.
//!
//! This crate contains:
//! - Entry normalization: turning loose JSON records into validated spans
//! - Coverage: time covered by exactly `k` distinct annotators
//! - Classification: per-segment support from other annotators, and splits
//! - Merging: grouping per-annotator record exports by item

pub mod classify;
pub mod coverage;
mod entry;
pub mod merge;
mod roster;
mod types;

pub use classify::{
    ClassificationReport, ClassificationSummary, ItemClassification, SegmentClassification,
    SupportLevel, classify, classify_item,
};
pub use coverage::{CoverageBuckets, CoverageReport, CoverageRow, compute_coverage, sweep_item};
pub use entry::{Dataset, Entry, EntryError, NormalizeStats};
pub use merge::{MergeOptions, MergeOutcome, SourceRecords, merge_sources};
pub use roster::{DEFAULT_ROSTER, Roster, RosterError};
pub use types::{AnnotatorId, ItemId, ValidationError};
