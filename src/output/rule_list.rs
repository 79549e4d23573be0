#![forbid(unsafe_code)]

//! Rule listing output formatters
//!
//! Formatters for the `logsieve rules` command: every compiled rule in rank
//! order, followed by the records that were rejected at compile time.

use crate::rules::RuleSet;
use serde::Serialize;

/// Whether a listed record made it into the compiled set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleState {
    Active,
    Rejected,
}

impl RuleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleState::Active => "active",
            RuleState::Rejected => "rejected",
        }
    }
}

/// One line of the rule listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    pub rule_id: Option<String>,
    pub name: String,
    pub state: RuleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build listing entries for a rule set
pub fn rule_entries(set: &RuleSet) -> Vec<RuleEntry> {
    let active = set.rules().iter().map(|rule| RuleEntry {
        rule_id: Some(rule.id().to_string()),
        name: rule.name().to_string(),
        state: RuleState::Active,
        severity: Some(rule.severity().to_string()),
        weight: Some(rule.weight()),
        keywords: rule.keywords().to_vec(),
        pattern: Some(rule.pattern().to_string()),
        error: None,
    });

    let rejected = set.rejected().iter().map(|rejection| RuleEntry {
        rule_id: rejection.rule_id.as_ref().map(|id| id.to_string()),
        name: rejection.name.clone(),
        state: RuleState::Rejected,
        severity: None,
        weight: None,
        keywords: Vec::new(),
        pattern: None,
        error: Some(rejection.error.to_string()),
    });

    active.chain(rejected).collect()
}

/// Human-readable formatter for rule listings
pub struct RuleListHumanFormatter;

impl RuleListHumanFormatter {
    pub fn new() -> Self {
        RuleListHumanFormatter
    }

    pub fn format(&self, entries: &[RuleEntry]) -> String {
        let active = entries
            .iter()
            .filter(|e| e.state == RuleState::Active)
            .count();
        let mut output = format!(
            "Rules ({} active, {} rejected):\n\n",
            active,
            entries.len() - active
        );

        for entry in entries {
            output.push_str(&format!(
                "{} ({})\n",
                entry.rule_id.as_deref().unwrap_or("<no id>"),
                entry.state.as_str()
            ));
            output.push_str(&format!("  Name: {}\n", entry.name));
            if let Some(severity) = &entry.severity {
                output.push_str(&format!("  Severity: {}\n", severity));
            }
            if let Some(weight) = entry.weight {
                output.push_str(&format!("  Weight: {}\n", weight));
            }
            if !entry.keywords.is_empty() {
                output.push_str(&format!("  Keywords: {}\n", entry.keywords.join(", ")));
            }
            if let Some(pattern) = &entry.pattern {
                output.push_str(&format!("  Pattern: {}\n", pattern));
            }
            if let Some(error) = &entry.error {
                output.push_str(&format!("  Error: {}\n", error));
            }
            output.push('\n');
        }

        output
    }

    pub fn write_to_stdout(&self, entries: &[RuleEntry]) {
        print!("{}", self.format(entries));
    }
}

impl Default for RuleListHumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// JSONL formatter for rule listings
pub struct RuleListJsonlFormatter;

impl RuleListJsonlFormatter {
    pub fn new() -> Self {
        RuleListJsonlFormatter
    }

    /// One JSON object per entry
    pub fn format(&self, entries: &[RuleEntry]) -> String {
        let mut output = String::new();
        for entry in entries {
            if let Ok(json) = serde_json::to_string(entry) {
                output.push_str(&json);
                output.push('\n');
            }
        }
        output
    }

    pub fn write_to_stdout(&self, entries: &[RuleEntry]) {
        print!("{}", self.format(entries));
    }
}

impl Default for RuleListJsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}
