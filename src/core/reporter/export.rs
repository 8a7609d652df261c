//! Export functionality for match reports.
//!
//! Supports CSV and JSON export for scripts and spreadsheets.

use super::Summary;
use crate::core::matcher::{MatchOutcome, MatchReport};
use serde::Serialize;
use std::io::Write;

/// Export outcomes to CSV format
///
/// CSV columns: Kind, Path A, Path B, Score, Digest, Failure Stage, Failed Path, Reason
pub fn export_csv<W: Write>(outcomes: &[MatchOutcome], mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "Kind,Path A,Path B,Score,Digest,Failure Stage,Failed Path,Reason"
    )?;

    for outcome in outcomes {
        let (a, b) = outcome.pair();
        let score = outcome
            .score()
            .map(|s| s.value().to_string())
            .unwrap_or_default();

        let (digest, stage, failed_path, reason) = match outcome {
            MatchOutcome::ExactDuplicate { digest, .. } => {
                (digest.to_hex(), String::new(), String::new(), String::new())
            }
            MatchOutcome::ComparisonFailed { failure, .. } => (
                String::new(),
                failure.stage.to_string(),
                failure
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                failure.reason.clone(),
            ),
            _ => Default::default(),
        };

        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            outcome.kind(),
            csv_field(&a.path.display().to_string()),
            csv_field(&b.path.display().to_string()),
            score,
            digest,
            stage,
            csv_field(&failed_path),
            csv_field(&reason)
        )?;
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'r> {
    summary: Summary,
    stats: &'r crate::core::matcher::MatchStats,
    outcomes: &'r [MatchOutcome],
}

/// Export the whole report as pretty-printed JSON
pub fn export_json<W: Write>(report: &MatchReport, writer: W) -> std::io::Result<()> {
    let document = JsonReport {
        summary: Summary::from_report(report),
        stats: &report.stats,
        outcomes: &report.outcomes,
    };
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

/// Quote a field when it contains a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
