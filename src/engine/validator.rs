//! Dry runs of rule records against sample lines
//!
//! Used when authoring rules: each record is compiled and scanned on its
//! own, without grouping, and every match is reported with its context.

use crate::engine::cancel::CancellationToken;
use crate::engine::context::{ContextWindow, extract_context};
use crate::engine::matcher::MatchEngine;
use crate::rules::{RuleCompiler, RuleDefinition};
use crate::types::RuleId;
use serde::Serialize;

/// A single match found while validating a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub line_number: usize,
    pub matched_text: String,
    pub context: ContextWindow,
}

/// Result of validating one rule record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleValidation {
    pub rule_id: Option<RuleId>,
    pub rule_name: String,
    /// Set when the record did not compile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub matched: bool,
    pub match_count: usize,
    pub matches: Vec<RuleMatch>,
}

/// Compiles and runs rule records one at a time
#[derive(Debug, Clone)]
pub struct RuleValidator {
    compiler: RuleCompiler,
    engine: MatchEngine,
    context_size: usize,
}

impl RuleValidator {
    pub fn new(compiler: RuleCompiler, engine: MatchEngine, context_size: usize) -> Self {
        Self {
            compiler,
            engine,
            context_size,
        }
    }

    /// Validate one record against `lines`
    ///
    /// Disabled records are still compiled and scanned.
    pub fn validate<S>(&self, definition: &RuleDefinition, lines: &[S]) -> RuleValidation
    where
        S: AsRef<str> + Sync,
    {
        let mut validation = RuleValidation {
            rule_id: definition.resolved_id(),
            rule_name: definition.name.clone(),
            error: None,
            matched: false,
            match_count: 0,
            matches: Vec::new(),
        };

        let rule = match self.compiler.compile(definition) {
            Ok(rule) => rule,
            Err(e) => {
                validation.error = Some(e.to_string());
                return validation;
            }
        };

        let rules = [rule];
        let output = match self.engine.scan(lines, &rules, &CancellationToken::new()) {
            Ok(output) => output,
            Err(e) => {
                validation.error = Some(e.to_string());
                return validation;
            }
        };

        validation.matches = output
            .records
            .iter()
            .filter_map(|record| {
                Some(RuleMatch {
                    line_number: record.line_number,
                    matched_text: record.matched_text.to_string(),
                    context: extract_context(lines, record.line_number - 1, self.context_size)?,
                })
            })
            .collect();
        validation.match_count = validation.matches.len();
        validation.matched = validation.match_count > 0;
        validation
    }

    pub fn validate_all<S>(&self, definitions: &[RuleDefinition], lines: &[S]) -> Vec<RuleValidation>
    where
        S: AsRef<str> + Sync,
    {
        definitions
            .iter()
            .map(|definition| self.validate(definition, lines))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::DEFAULT_CONTEXT_SIZE;

    fn validator() -> RuleValidator {
        RuleValidator::new(RuleCompiler::default(), MatchEngine::new(), DEFAULT_CONTEXT_SIZE)
    }

    #[test]
    fn test_reports_every_match() {
        let lines = ["start", "Segmentation fault", "retry", "segmentation FAULT (core dumped)"];
        let result = validator().validate(&RuleDefinition::new("Segfault", "segmentation fault"), &lines);

        assert_eq!(result.rule_id.as_ref().map(|id| id.as_str()), Some("segfault"));
        assert!(result.matched);
        assert_eq!(result.match_count, 2);
        assert_eq!(result.matches[0].line_number, 2);
        assert_eq!(result.matches[1].matched_text, "segmentation FAULT");
        assert_eq!(result.matches[1].context.before.len(), 3);
    }

    #[test]
    fn test_no_match() {
        let result = validator().validate(&RuleDefinition::new("Segfault", "segfault"), &["fine"]);
        assert!(!result.matched);
        assert_eq!(result.match_count, 0);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_invalid_record_reports_error() {
        let result = validator().validate(&RuleDefinition::new("Broken", "(unclosed"), &["x"]);
        assert!(!result.matched);
        let error = result.error.unwrap();
        assert!(error.contains("Invalid regex pattern for rule 'broken'"), "{}", error);
    }

    #[test]
    fn test_validate_all_keeps_order() {
        let definitions = vec![
            RuleDefinition::new("B", "b"),
            RuleDefinition::new("A", "a").with_enabled(false),
        ];
        let results = validator().validate_all(&definitions, &["a", "b"]);
        let names: Vec<&str> = results.iter().map(|r| r.rule_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(results.iter().all(|r| r.matched));
    }
}
