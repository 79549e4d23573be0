#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. One group record per error group, in rank order
//! 2. One summary record with the report totals

use crate::engine::{AnalysisReport, ErrorGroup, Stats};
use serde::Serialize;
use std::io::{self, Write};

/// JSONL output formatter
pub struct JsonlFormatter;

impl JsonlFormatter {
    /// Creates a new JsonlFormatter
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format a report as JSONL; `source` names the analyzed input
    pub fn format(&self, source: &str, report: &AnalysisReport) -> String {
        let mut output = String::new();

        for group in &report.error_groups {
            let record = GroupRecord {
                record_type: "group",
                source,
                group,
            };
            if let Ok(json) = serde_json::to_string(&record) {
                output.push_str(&json);
                output.push('\n');
            }
        }

        let summary = SummaryRecord {
            record_type: "summary",
            source,
            stats: &report.stats,
            total_lines: report.total_lines,
            rules_applied: report.rules_applied,
            skipped_evaluations: report.skipped_evaluations,
            elapsed_ms: report.elapsed_ms,
        };
        if let Ok(json) = serde_json::to_string(&summary) {
            output.push_str(&json);
            output.push('\n');
        }

        output
    }

    /// Write the formatted report to stdout
    pub fn write_to_stdout(&self, source: &str, report: &AnalysisReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(self.format(source, report).as_bytes())?;
        stdout.flush()
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Group record for JSONL output
#[derive(Debug, Serialize)]
struct GroupRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    source: &'a str,
    #[serde(flatten)]
    group: &'a ErrorGroup,
}

/// Summary record for JSONL output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    source: &'a str,
    stats: &'a Stats,
    total_lines: usize,
    rules_applied: usize,
    skipped_evaluations: usize,
    elapsed_ms: u64,
}
