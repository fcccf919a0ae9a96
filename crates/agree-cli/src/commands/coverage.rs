//! Coverage command: time covered by exactly `k` distinct annotators.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use agree_core::{CoverageReport, compute_coverage};
use anyhow::Result;

use super::util::load_dataset;

/// Formats the coverage report for humans.
pub fn format_coverage(report: &CoverageReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "--- Time Agreement Stats ---");
    let _ = writeln!(
        output,
        "Total Annotated Duration (union): {:.2} seconds",
        report.union_seconds
    );
    for row in &report.rows {
        let _ = writeln!(
            output,
            "Covered by exactly {} annotators: {:.2} s ({:.2}%)",
            row.annotators, row.seconds, row.percent
        );
    }
    output
}

/// Runs the coverage command.
pub fn run<W: Write>(writer: &mut W, input: &Path, json: bool) -> Result<()> {
    let dataset = load_dataset(input)?;
    let report = CoverageReport::from(&compute_coverage(&dataset));

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_coverage(&report))?;
    }
    Ok(())
}
