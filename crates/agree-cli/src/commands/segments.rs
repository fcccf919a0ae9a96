//! Segments command: per-segment support and split detection.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use agree_core::{
    AnnotatorId, ClassificationReport, ClassificationSummary, Roster, SegmentClassification,
    classify,
};
use anyhow::Result;
use serde::Serialize;

use super::util::{load_dataset, percent};

/// Segment statistics as emitted in JSON output.
#[derive(Debug, Serialize)]
pub struct JsonSegments<'a> {
    #[serde(flatten)]
    pub summary: ClassificationSummary,
    pub split_rate: f64,
    pub annotators_seen: &'a BTreeSet<AnnotatorId>,
    pub unrostered: &'a BTreeSet<AnnotatorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_segments: Option<Vec<&'a SegmentClassification>>,
}

impl<'a> JsonSegments<'a> {
    pub fn new(report: &'a ClassificationReport, details: bool) -> Self {
        Self {
            summary: report.summary,
            split_rate: report.summary.split_rate(),
            annotators_seen: &report.annotators_seen,
            unrostered: &report.unrostered,
            split_segments: details.then(|| split_segments(report).collect()),
        }
    }
}

fn split_segments(report: &ClassificationReport) -> impl Iterator<Item = &SegmentClassification> {
    report.segments.iter().filter(|s| s.is_split())
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a AnnotatorId>) -> String {
    ids.into_iter()
        .map(AnnotatorId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats the classification report for humans.
pub fn format_segments(report: &ClassificationReport, roster: &Roster, details: bool) -> String {
    let summary = &report.summary;
    let total = summary.total;
    let others = roster.len().saturating_sub(1);

    let mut output = String::new();
    let _ = writeln!(output, "--- Segment Agreement Stats ---");
    let _ = writeln!(
        output,
        "Unique Annotators Found in segments: {}",
        join_ids(&report.annotators_seen)
    );
    if !report.unrostered.is_empty() {
        let _ = writeln!(
            output,
            "Outside roster (never counted as support): {}",
            join_ids(&report.unrostered)
        );
    }
    let _ = writeln!(output, "Total Segments Checked: {total}");
    if total == 0 {
        return output;
    }

    let partial_label = if others <= 2 {
        "1 matching ann".to_string()
    } else {
        format!("1-{} matching anns", others - 1)
    };
    let _ = writeln!(
        output,
        "Isolated (No overlap): {} ({:.2}%)",
        summary.isolated,
        percent(summary.isolated, total)
    );
    let _ = writeln!(
        output,
        "Partial Support ({partial_label}): {} ({:.2}%)",
        summary.partial,
        percent(summary.partial, total)
    );
    let _ = writeln!(
        output,
        "Full Support ({others} matching anns): {} ({:.2}%)",
        summary.full,
        percent(summary.full, total)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Split Cases Detected: {}", summary.split_cases);
    let _ = writeln!(
        output,
        "(One segment overlaps with >=2 segments from a single other annotator)"
    );
    let _ = writeln!(output, "Rate: {:.2}%", summary.split_rate() * 100.0);

    if details && summary.split_cases > 0 {
        let _ = writeln!(output);
        let _ = writeln!(output, "Split segments:");
        for segment in split_segments(report) {
            let _ = writeln!(
                output,
                "  {} ann {} [{:.2}, {:.2}) split against {}",
                segment.item,
                segment.annotator,
                segment.start,
                segment.end,
                join_ids(&segment.split_against)
            );
        }
    }

    output
}

/// Runs the segments command.
pub fn run<W: Write>(
    writer: &mut W,
    input: &Path,
    roster: &Roster,
    json: bool,
    details: bool,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let report = classify(&dataset, roster);

    if json {
        let body = JsonSegments::new(&report, details);
        writeln!(writer, "{}", serde_json::to_string_pretty(&body)?)?;
    } else {
        write!(writer, "{}", format_segments(&report, roster, details))?;
    }
    Ok(())
}
