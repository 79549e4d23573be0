//! Single-document JSON output

use crate::engine::AnalysisReport;
use serde::Serialize;

#[derive(Serialize)]
struct SourcedReport<'a> {
    source: &'a str,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

/// Pretty-printed JSON document per report
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter
    }

    pub fn format(&self, source: &str, report: &AnalysisReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&SourcedReport { source, report })
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
