//! Report rendering: table, JSON and CSV.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use tabled::{builder::Builder, Table};

use txguard_core::RiskLevel;
use txguard_runtime::{BatchReport, BatchSummary, RecordOutcome};

const NO_ERRORS: &str = "No Errors";
const NO_ACTIONS: &str = "No Actions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// One evaluated record, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Customer_ID")]
    pub label: String,

    #[serde(rename = "Errors")]
    pub errors: String,

    #[serde(rename = "Remediation Actions")]
    pub remediation: String,

    #[serde(rename = "Risk Score")]
    pub risk_score: u32,

    #[serde(rename = "Risk Level")]
    pub risk_level: RiskLevel,
}

/// A record that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub label: String,
    pub error: String,
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

impl ReportRow {
    /// `None` for rejected records.
    pub fn from_outcome(outcome: &RecordOutcome) -> Option<Self> {
        let explained = outcome.result.as_ref().ok()?;
        let verdict = &explained.verdict;

        Some(Self {
            label: outcome.label(),
            errors: join_or(&verdict.errors, NO_ERRORS),
            remediation: join_or(&explained.remediation_actions(), NO_ACTIONS),
            risk_score: verdict.risk_score,
            risk_level: verdict.risk_level(),
        })
    }
}

/// Split a report into display rows at or above `min_score`, and rejections.
pub fn build_rows(report: &BatchReport, min_score: u32) -> (Vec<ReportRow>, Vec<RejectedRow>) {
    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(_) => {
                if let Some(row) = ReportRow::from_outcome(outcome) {
                    if row.risk_score >= min_score {
                        rows.push(row);
                    }
                }
            }
            Err(e) => rejected.push(RejectedRow {
                label: outcome.label(),
                error: e.to_string(),
            }),
        }
    }

    (rows, rejected)
}

pub fn render_table(rows: &[ReportRow]) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "Customer_ID",
        "Errors",
        "Remediation Actions",
        "Risk Score",
        "Risk Level",
    ]);
    for row in rows {
        builder.push_record([
            row.label.clone(),
            row.errors.clone(),
            row.remediation.clone(),
            row.risk_score.to_string(),
            row.risk_level.to_string(),
        ]);
    }
    Table::from(builder).to_string()
}

pub fn render_csv(rows: &[ReportRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    records: &'a [ReportRow],
    rejected: &'a [RejectedRow],
    summary: &'a BatchSummary,
}

pub fn render_json(
    rows: &[ReportRow],
    rejected: &[RejectedRow],
    summary: &BatchSummary,
) -> Result<String> {
    let report = JsonReport {
        records: rows,
        rejected,
        summary,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// One-line batch summary.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut line = format!(
        "{} records: {} clean, {} flagged, {} rejected (total score {}, max {})",
        summary.records,
        summary.clean,
        summary.flagged,
        summary.rejected,
        summary.total_score,
        summary.max_score
    );
    if summary.explanations + summary.explanations_skipped > 0 {
        line.push_str(&format!(
            "; {} explanations, {} skipped",
            summary.explanations, summary.explanations_skipped
        ));
    }
    line
}
