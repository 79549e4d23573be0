#![forbid(unsafe_code)]

//! Grouping of match records into error groups
//!
//! Records are grouped by rule and trimmed line text. A group keeps the rule
//! metadata, every occurrence sorted by line number, and the first and last
//! line numbers; each occurrence carries its context window.

use crate::engine::context::{ContextWindow, extract_context};
use crate::engine::matcher::MatchRecord;
use crate::rules::CompiledRule;
use crate::types::{RuleId, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// One line where a group's rule matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub line_number: usize,
    pub raw_line: String,
    pub matched_text: String,
    pub context: ContextWindow,
}

/// All occurrences of one rule on one normalized line text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorGroup {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub severity: Severity,
    pub weight: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// The trimmed line text shared by every occurrence
    pub message: String,
    pub count: usize,
    pub first_occurrence_line: usize,
    pub last_occurrence_line: usize,
    pub occurrences: Vec<Occurrence>,
}

struct PendingGroup<'a> {
    rule: &'a CompiledRule,
    hits: Vec<MatchRecord<'a>>,
}

/// Accumulates match records into groups
#[derive(Default)]
pub struct Aggregator<'a> {
    groups: BTreeMap<(&'a RuleId, &'a str), PendingGroup<'a>>,
}

impl<'a> Aggregator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: MatchRecord<'a>) {
        let message = record.raw_line.trim();
        self.groups
            .entry((record.rule.id(), message))
            .or_insert_with(|| PendingGroup {
                rule: record.rule,
                hits: Vec::new(),
            })
            .hits
            .push(record);
    }

    /// Number of groups so far
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Finalize the groups, attaching context windows from `lines`
    ///
    /// Groups come out ordered by rule id then message; ranking is a
    /// separate step. Hits whose line is not in `lines` are dropped, and a
    /// group left with no occurrences is omitted.
    pub fn finish<S: AsRef<str>>(self, lines: &[S], context_size: usize) -> Vec<ErrorGroup> {
        self.groups
            .into_iter()
            .filter_map(|((_, message), mut pending)| {
                pending.hits.sort_by_key(|hit| hit.line_number);
                pending.hits.dedup_by_key(|hit| hit.line_number);

                let occurrences: Vec<Occurrence> = pending
                    .hits
                    .iter()
                    .filter_map(|hit| {
                        let index = hit.line_number.checked_sub(1)?;
                        let context = extract_context(lines, index, context_size)?;
                        Some(Occurrence {
                            line_number: hit.line_number,
                            raw_line: hit.raw_line.to_string(),
                            matched_text: hit.matched_text.to_string(),
                            context,
                        })
                    })
                    .collect();

                // Hits outside `lines` have no context and are dropped
                let first = occurrences.first()?.line_number;
                let last = occurrences.last()?.line_number;

                let rule = pending.rule;
                Some(ErrorGroup {
                    rule_id: rule.id().clone(),
                    rule_name: rule.name().to_string(),
                    severity: rule.severity(),
                    weight: rule.weight(),
                    solution: rule.solution().map(str::to_string),
                    message: message.to_string(),
                    count: occurrences.len(),
                    first_occurrence_line: first,
                    last_occurrence_line: last,
                    occurrences,
                })
            })
            .collect()
    }
}

impl<'a> Extend<MatchRecord<'a>> for Aggregator<'a> {
    fn extend<I: IntoIterator<Item = MatchRecord<'a>>>(&mut self, records: I) {
        for record in records {
            self.add(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cancel::CancellationToken;
    use crate::engine::matcher::MatchEngine;
    use crate::rules::{RuleCompiler, RuleDefinition};

    fn group<S: AsRef<str> + Sync>(
        lines: &[S],
        definitions: Vec<RuleDefinition>,
        context_size: usize,
    ) -> Vec<ErrorGroup> {
        let rules = RuleCompiler::default().compile_all(&definitions).rules;
        let output = MatchEngine::new()
            .scan(lines, &rules, &CancellationToken::new())
            .unwrap();
        let mut aggregator = Aggregator::new();
        aggregator.extend(output.records);
        aggregator.finish(lines, context_size)
    }

    #[test]
    fn test_identical_lines_share_a_group() {
        let lines = [
            "boot ok",
            "ERROR: disk full",
            "retry",
            "ERROR: disk full",
            "done",
        ];
        let groups = group(
            &lines,
            vec![RuleDefinition::new("Disk", "disk full").with_keywords(["error"])],
            1,
        );

        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.count, 2);
        assert_eq!(g.first_occurrence_line, 2);
        assert_eq!(g.last_occurrence_line, 4);
        assert_eq!(g.message, "ERROR: disk full");
        assert_eq!(g.occurrences.len(), 2);
        assert_eq!(g.occurrences[0].context.before[0].content, "boot ok");
        assert_eq!(g.occurrences[1].context.after[0].content, "done");
    }

    #[test]
    fn test_whitespace_variants_share_a_group() {
        let lines = ["  disk full", "disk full  "];
        let groups = group(&lines, vec![RuleDefinition::new("Disk", "disk full")], 0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].message, "disk full");
        assert_eq!(groups[0].occurrences[0].raw_line, "  disk full");
    }

    #[test]
    fn test_distinct_lines_form_distinct_groups() {
        let lines = ["disk full on /", "disk full on /var"];
        let groups = group(&lines, vec![RuleDefinition::new("Disk", "disk full")], 0);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.count == 1));
    }

    #[test]
    fn test_same_line_different_rules_form_distinct_groups() {
        let lines = ["disk full"];
        let groups = group(
            &lines,
            vec![
                RuleDefinition::new("Disk", "disk"),
                RuleDefinition::new("Full", "full"),
            ],
            0,
        );
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_group_invariants_hold() {
        let lines: Vec<String> = (0..40)
            .map(|i| if i % 3 == 0 { "timeout".to_string() } else { format!("ok {}", i) })
            .collect();
        let groups = group(&lines, vec![RuleDefinition::new("Timeout", "timeout")], 2);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.count, g.occurrences.len());
        assert_eq!(g.first_occurrence_line, g.occurrences[0].line_number);
        assert_eq!(g.last_occurrence_line, g.occurrences.last().unwrap().line_number);
        assert!(
            g.occurrences
                .windows(2)
                .all(|w| w[0].line_number < w[1].line_number)
        );
        assert!(g.occurrences.iter().all(|o| o.context.current.is_match));
    }

    #[test]
    fn test_hits_beyond_lines_are_dropped_consistently() {
        let lines = ["boom", "ok", "boom"];
        let rules = RuleCompiler::default()
            .compile_all(&[RuleDefinition::new("Boom", "boom")])
            .rules;
        let output = MatchEngine::new()
            .scan(&lines, &rules, &CancellationToken::new())
            .unwrap();
        let mut aggregator = Aggregator::new();
        aggregator.extend(output.records.iter().copied());
        let groups = aggregator.finish(&lines[..2], 0);

        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.count, 1);
        assert_eq!(g.first_occurrence_line, 1);
        assert_eq!(g.last_occurrence_line, 1);
        assert_eq!(g.occurrences.len(), 1);

        let mut aggregator = Aggregator::new();
        aggregator.extend(output.records.iter().map(|r| MatchRecord { line_number: 0, ..*r }));
        assert!(aggregator.finish(&lines, 0).is_empty());

        let mut aggregator = Aggregator::new();
        aggregator.extend(output.records.iter().copied());
        let none: [&str; 0] = [];
        assert!(aggregator.finish(&none, 0).is_empty());
    }

    #[test]
    fn test_empty_aggregator_finishes_empty() {
        let aggregator = Aggregator::new();
        assert!(aggregator.is_empty());
        let lines: [&str; 0] = [];
        assert!(aggregator.finish(&lines, 3).is_empty());
    }

    #[test]
    fn test_group_serializes_camel_case() {
        let groups = group(
            &["disk full"],
            vec![RuleDefinition::new("Disk", "disk full").with_solution("free space")],
            0,
        );
        let json = serde_json::to_value(&groups[0]).unwrap();
        assert_eq!(json["ruleId"], "disk");
        assert_eq!(json["severity"], "ERROR");
        assert_eq!(json["firstOccurrenceLine"], 1);
        assert_eq!(json["solution"], "free space");
        assert_eq!(json["occurrences"][0]["matchedText"], "disk full");
    }
}
