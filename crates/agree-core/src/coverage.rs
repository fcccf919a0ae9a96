//! Coverage sweep: time covered by exactly `k` distinct annotators.
//!
//! # Algorithm Summary
//!
//! 1. Turn every entry of an item into an open and a close [`Event`]
//! 2. Sort events with [`event_order`]: time ascending, closes before opens
//! 3. Walk the events; the span since the previous event is credited to the
//!    bucket for the number of distinct annotators active during that span
//!
//! Because closes sort before opens, an entry ending exactly where another
//! begins contributes no shared time at that instant. Gaps with no active
//! annotator are never credited, so the buckets sum to the union of the
//! item's entries.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::Serialize;

use crate::entry::{Dataset, Entry};
use crate::types::AnnotatorId;

/// Direction of an event. `Close` orders before `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Delta {
    Close,
    Open,
}

impl Delta {
    /// Signed change applied to the annotator's open-span counter.
    pub const fn value(self) -> i64 {
        match self {
            Self::Close => -1,
            Self::Open => 1,
        }
    }
}

/// An entry boundary on the item timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<'a> {
    pub time: f64,
    pub delta: Delta,
    pub annotator: &'a AnnotatorId,
}

/// Sweep order: time ascending, then closes before opens.
///
/// The annotator tiebreak only makes the order total; it has no effect on
/// accumulated durations.
pub fn event_order(a: &Event<'_>, b: &Event<'_>) -> Ordering {
    a.time
        .total_cmp(&b.time)
        .then(a.delta.cmp(&b.delta))
        .then_with(|| a.annotator.cmp(b.annotator))
}

/// Builds the sorted event list for one item.
pub fn item_events(entries: &[Entry]) -> Vec<Event<'_>> {
    let mut events: Vec<Event<'_>> = entries
        .iter()
        .flat_map(|entry| {
            [
                Event {
                    time: entry.start,
                    delta: Delta::Open,
                    annotator: &entry.annotator,
                },
                Event {
                    time: entry.end,
                    delta: Delta::Close,
                    annotator: &entry.annotator,
                },
            ]
        })
        .collect();
    events.sort_by(event_order);
    events
}

/// Per-annotator count of currently open spans.
///
/// Counters are signed and never clamped: a negative counter means the
/// events were unbalanced.
#[derive(Debug, Default)]
pub struct AnnotatorActivity<'a> {
    open: HashMap<&'a AnnotatorId, i64>,
}

impl<'a> AnnotatorActivity<'a> {
    /// Applies an event and returns the annotator's new counter.
    pub fn apply(&mut self, event: &Event<'a>) -> i64 {
        let counter = self.open.entry(event.annotator).or_insert(0);
        *counter += event.delta.value();
        *counter
    }

    /// Number of annotators with at least one open span.
    pub fn distinct_active(&self) -> usize {
        self.open.values().filter(|&&c| c > 0).count()
    }

    pub fn counter(&self, annotator: &AnnotatorId) -> i64 {
        self.open.get(annotator).copied().unwrap_or(0)
    }
}

/// Total seconds keyed by distinct-annotator count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageBuckets {
    by_count: BTreeMap<usize, f64>,
}

impl CoverageBuckets {
    /// Credits `seconds` to the bucket for `count` annotators.
    pub fn add(&mut self, count: usize, seconds: f64) {
        *self.by_count.entry(count).or_insert(0.0) += seconds;
    }

    /// Seconds covered by exactly `count` annotators.
    pub fn get(&self, count: usize) -> f64 {
        self.by_count.get(&count).copied().unwrap_or(0.0)
    }

    /// Adds every bucket of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (&count, &seconds) in &other.by_count {
            self.add(count, seconds);
        }
    }

    /// Sum of all buckets: the measure of the annotated union.
    pub fn union_total(&self) -> f64 {
        self.by_count.values().sum()
    }

    /// Iterates `(count, seconds)` with ascending count.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.by_count.iter().map(|(&k, &v)| (k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.by_count.is_empty()
    }
}

/// Sweeps one item's entries into coverage buckets.
pub fn sweep_item(entries: &[Entry]) -> CoverageBuckets {
    let mut buckets = CoverageBuckets::default();
    let events = item_events(entries);
    let Some(first) = events.first() else {
        return buckets;
    };

    let mut activity = AnnotatorActivity::default();
    let mut distinct = 0;
    let mut prev_time = first.time;

    for event in &events {
        let elapsed = event.time - prev_time;
        if distinct > 0 && elapsed > 0.0 {
            buckets.add(distinct, elapsed);
        }
        activity.apply(event);
        distinct = activity.distinct_active();
        prev_time = event.time;
    }

    buckets
}

/// Sweeps every item and sums the buckets.
///
/// Items are swept in parallel and merged in item order, so the totals do not
/// depend on scheduling.
pub fn compute_coverage(dataset: &Dataset) -> CoverageBuckets {
    let per_item: Vec<CoverageBuckets> = dataset
        .items_vec()
        .par_iter()
        .map(|(_, entries)| sweep_item(entries))
        .collect();

    let mut total = CoverageBuckets::default();
    for buckets in &per_item {
        total.merge(buckets);
    }
    tracing::debug!(
        items = per_item.len(),
        union_seconds = total.union_total(),
        "computed coverage"
    );
    total
}

/// One line of the coverage report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    /// Number of distinct annotators.
    pub annotators: usize,
    pub seconds: f64,
    /// Share of the annotated union, in percent.
    pub percent: f64,
}

/// Coverage buckets with their share of the union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub rows: Vec<CoverageRow>,
    pub union_seconds: f64,
}

impl From<&CoverageBuckets> for CoverageReport {
    fn from(buckets: &CoverageBuckets) -> Self {
        let union_seconds = buckets.union_total();
        let rows = buckets
            .iter()
            .map(|(annotators, seconds)| CoverageRow {
                annotators,
                seconds,
                percent: if union_seconds > 0.0 {
                    seconds / union_seconds * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        Self {
            rows,
            union_seconds,
        }
    }
}
