//! Report command: coverage and segment statistics in one run.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use agree_core::{
    ClassificationReport, CoverageReport, NormalizeStats, Roster, classify, compute_coverage,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::coverage::format_coverage;
use super::segments::{JsonSegments, format_segments};
use super::util::load_dataset;

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub roster: Roster,
    pub normalization: NormalizeStats,
    pub coverage: CoverageReport,
    pub segments: ClassificationReport,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    input: &'a str,
    roster: &'a Roster,
    normalization: NormalizeStats,
    coverage: &'a CoverageReport,
    segments: JsonSegments<'a>,
}

/// Loads the input and runs both analyses.
pub fn generate_report_data(
    input: &Path,
    roster: &Roster,
    generated_at: DateTime<Utc>,
) -> Result<ReportData> {
    let dataset = load_dataset(input)?;

    tracing::debug!("calculating time overlaps");
    let coverage = CoverageReport::from(&compute_coverage(&dataset));

    tracing::debug!("calculating segment stats");
    let segments = classify(&dataset, roster);

    Ok(ReportData {
        generated_at,
        input: input.display().to_string(),
        roster: roster.clone(),
        normalization: dataset.stats(),
        coverage,
        segments,
    })
}

/// Formats the report for humans.
pub fn format_report(data: &ReportData) -> String {
    let stats = data.normalization;
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Input: {} ({} items, {} entries, {} dropped records)",
        data.input, stats.items, stats.entries, stats.dropped
    );
    let _ = writeln!(output);
    output.push_str(&format_coverage(&data.coverage));
    let _ = writeln!(output);
    output.push_str(&format_segments(&data.segments, &data.roster, false));
    output
}

/// Formats the report as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        input: &data.input,
        roster: &data.roster,
        normalization: data.normalization,
        coverage: &data.coverage,
        segments: JsonSegments::new(&data.segments, false),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, input: &Path, roster: &Roster, json: bool) -> Result<()> {
    let data = generate_report_data(input, roster, Utc::now())?;

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insta::assert_snapshot;

    const INPUT: &str = r#"{
        "x1": [
            {"start": 0, "end": 10, "completed_by": 1},
            {"start": 4, "end": 6, "completed_by": 2},
            {"start": 7, "end": 9, "completed_by": 2}
        ],
        "x2": [
            {"start": "0", "end": "10", "completed_by": 1.0},
            {"start": 10, "end": 20, "completed_by": 2},
            {"start": 2, "end": 8, "completed_by": 3},
            {"start": 5, "end": 5, "completed_by": 3},
            {"start": 1, "end": 3}
        ]
    }"#;

    fn report_data() -> (tempfile::TempDir, ReportData) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("merged.json");
        std::fs::write(&path, INPUT).unwrap();
        let generated_at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let mut data = generate_report_data(&path, &Roster::default(), generated_at).unwrap();
        data.input = "[TEMP]/merged.json".to_string();
        (temp, data)
    }

    #[test]
    fn test_report_human_output() {
        let (_temp, data) = report_data();
        assert_snapshot!(format_report(&data).trim_end(), @r"
        Input: [TEMP]/merged.json (2 items, 6 entries, 2 dropped records)

        --- Time Agreement Stats ---
        Total Annotated Duration (union): 30.00 seconds
        Covered by exactly 1 annotators: 20.00 s (66.67%)
        Covered by exactly 2 annotators: 10.00 s (33.33%)

        --- Segment Agreement Stats ---
        Unique Annotators Found in segments: 1, 2, 3
        Total Segments Checked: 6
        Isolated (No overlap): 1 (16.67%)
        Partial Support (1 matching ann): 5 (83.33%)
        Full Support (2 matching anns): 0 (0.00%)

        Split Cases Detected: 1
        (One segment overlaps with >=2 segments from a single other annotator)
        Rate: 16.67%
        ");
    }

    #[test]
    fn test_report_json_output() {
        let (_temp, data) = report_data();
        let json = format_report_json(&data).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["generated_at"], "2026-01-05T12:00:00+00:00");
        assert_eq!(value["roster"], serde_json::json!(["1", "2", "3"]));
        assert_eq!(value["normalization"]["dropped"], 2);
        assert_eq!(value["coverage"]["union_seconds"], 30.0);
        assert_eq!(value["segments"]["total"], 6);
        assert_eq!(value["segments"]["partial"], 5);
        assert!(value["segments"].get("split_segments").is_none());
    }

    #[test]
    fn test_report_missing_input_fails_without_output() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();
        let err = run(
            &mut output,
            &temp.path().join("nope.json"),
            &Roster::default(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("input file not found"));
        assert!(output.is_empty());
    }
}
