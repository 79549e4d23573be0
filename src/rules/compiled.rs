#![forbid(unsafe_code)]

//! Rule compilation
//!
//! [`RuleCompiler`] turns validated rule records into [`CompiledRule`]s.
//! A record that fails validation or whose pattern does not compile is
//! logged, recorded as a [`RuleRejection`] and left out; it never aborts the
//! rest of the set.

use crate::error::RuleError;
use crate::rules::rule::{RuleDefinition, ValidatedRule};
use crate::types::{PrefilterMode, RuleId, Severity};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Upper bound on the compiled size of a single pattern
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 4 * (1 << 20);

/// Result of evaluating one rule against one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// The pattern matched; holds the first matched substring
    Matched(&'a str),
    /// Pre-filter rejected the line or the pattern did not match
    NoMatch,
    /// The pattern was not executed for this line
    Skipped(SkipReason),
}

/// Why a pattern evaluation was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The line exceeds the configured maximum length
    LineTooLong { length: usize, limit: usize },
}

/// An immutable, executable view of a rule
#[derive(Debug, Clone)]
pub struct CompiledRule {
    id: RuleId,
    name: String,
    pattern: Regex,
    keywords: Vec<String>,
    severity: Severity,
    weight: u8,
    solution: Option<String>,
}

impl CompiledRule {
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Lower-cased pre-filter keywords
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn weight(&self) -> u8 {
        self.weight
    }

    pub fn solution(&self) -> Option<&str> {
        self.solution.as_deref()
    }

    /// Cheap keyword gate in front of the pattern engine
    ///
    /// `lowered_line` must already be lower-cased. A rule without keywords
    /// always passes.
    pub fn passes_prefilter(&self, lowered_line: &str, mode: PrefilterMode) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        match mode {
            PrefilterMode::Any => self.keywords.iter().any(|k| lowered_line.contains(k.as_str())),
            PrefilterMode::All => self.keywords.iter().all(|k| lowered_line.contains(k.as_str())),
        }
    }

    /// Run the compiled pattern against a line
    ///
    /// Lines longer than `max_line_length` bytes are not handed to the
    /// pattern engine and yield [`MatchOutcome::Skipped`].
    pub fn evaluate<'a>(&self, line: &'a str, max_line_length: usize) -> MatchOutcome<'a> {
        if line.len() > max_line_length {
            return MatchOutcome::Skipped(SkipReason::LineTooLong {
                length: line.len(),
                limit: max_line_length,
            });
        }
        match self.pattern.find(line) {
            Some(m) => MatchOutcome::Matched(m.as_str()),
            None => MatchOutcome::NoMatch,
        }
    }

    /// Pre-filter then pattern, as the match engine applies them
    pub fn check<'a>(
        &self,
        line: &'a str,
        lowered_line: &str,
        prefilter: PrefilterMode,
        max_line_length: usize,
    ) -> MatchOutcome<'a> {
        if !self.passes_prefilter(lowered_line, prefilter) {
            return MatchOutcome::NoMatch;
        }
        self.evaluate(line, max_line_length)
    }

    /// Rank order used to sort compiled rule sets
    ///
    /// Severity rank ascending, weight descending, id ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| other.weight.cmp(&self.weight))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A rule record that could not be compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRejection {
    /// Resolved identity, if the record had one
    pub rule_id: Option<RuleId>,
    pub name: String,
    pub error: RuleError,
}

/// Output of compiling a batch of rule records
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Compiled rules in rank order
    pub rules: Vec<CompiledRule>,
    pub rejected: Vec<RuleRejection>,
}

/// Compiles rule records into executable rules
#[derive(Debug, Clone)]
pub struct RuleCompiler {
    case_insensitive: bool,
    size_limit: usize,
}

impl RuleCompiler {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }

    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Compile a single record
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidDefinition` if the record fails validation
    /// and `RuleError::InvalidRegex` if the pattern does not compile.
    pub fn compile(&self, definition: &RuleDefinition) -> Result<CompiledRule, RuleError> {
        let validated = definition.validate()?;
        self.compile_validated(validated)
    }

    fn compile_validated(&self, rule: ValidatedRule) -> Result<CompiledRule, RuleError> {
        let pattern = RegexBuilder::new(&rule.pattern)
            .case_insensitive(self.case_insensitive)
            .size_limit(self.size_limit)
            .build()
            .map_err(|e| RuleError::InvalidRegex {
                rule_id: rule.id.clone(),
                message: e.to_string(),
            })?;

        Ok(CompiledRule {
            id: rule.id,
            name: rule.name,
            pattern,
            keywords: rule.keywords,
            severity: rule.severity,
            weight: rule.weight,
            solution: rule.solution,
        })
    }

    /// Compile every enabled record, isolating failures
    ///
    /// Disabled records are skipped silently. Failing records are logged at
    /// warn level and reported in [`CompileOutput::rejected`]. A record whose
    /// id repeats an earlier compiled rule is rejected as a duplicate.
    pub fn compile_all(&self, definitions: &[RuleDefinition]) -> CompileOutput {
        let mut output = CompileOutput::default();
        let mut seen: HashSet<RuleId> = HashSet::new();

        for definition in definitions.iter().filter(|d| d.enabled) {
            let result = self.compile(definition).and_then(|rule| {
                if seen.insert(rule.id.clone()) {
                    Ok(rule)
                } else {
                    Err(RuleError::InvalidDefinition(format!(
                        "duplicate rule id '{}'",
                        rule.id
                    )))
                }
            });

            match result {
                Ok(rule) => output.rules.push(rule),
                Err(error) => {
                    let rule_id = definition.resolved_id();
                    tracing::warn!(
                        rule_id = rule_id.as_ref().map(RuleId::as_str).unwrap_or("<none>"),
                        rule_name = %definition.name,
                        error = %error,
                        "excluding rule that failed to compile"
                    );
                    output.rejected.push(RuleRejection {
                        rule_id,
                        name: definition.name.clone(),
                        error,
                    });
                }
            }
        }

        output.rules.sort_by(CompiledRule::rank_cmp);
        output
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(definition: RuleDefinition) -> CompiledRule {
        RuleCompiler::default().compile(&definition).unwrap()
    }

    #[test]
    fn test_compile_simple() {
        let rule = compile(
            RuleDefinition::new("Disk full", "ERROR: disk full")
                .with_keywords(["Error"])
                .with_weight(80),
        );
        assert_eq!(rule.id().as_str(), "disk-full");
        assert_eq!(rule.keywords(), &["error".to_string()]);
        assert_eq!(rule.weight(), 80);
        assert_eq!(rule.severity(), Severity::Error);
    }

    #[test]
    fn test_compile_invalid_regex() {
        let result = RuleCompiler::default().compile(&RuleDefinition::new("bad", "[unclosed"));
        assert!(matches!(result, Err(RuleError::InvalidRegex { .. })));
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let rule = compile(RuleDefinition::new("r", "disk full"));
        assert_eq!(
            rule.evaluate("ERROR: DISK FULL", 1024),
            MatchOutcome::Matched("DISK FULL")
        );
    }

    #[test]
    fn test_case_sensitive_when_configured() {
        let rule = RuleCompiler::new(false)
            .compile(&RuleDefinition::new("r", "disk full"))
            .unwrap();
        assert_eq!(rule.evaluate("DISK FULL", 1024), MatchOutcome::NoMatch);
        assert_eq!(
            rule.evaluate("disk full", 1024),
            MatchOutcome::Matched("disk full")
        );
    }

    #[test]
    fn test_prefilter_any() {
        let rule = compile(RuleDefinition::new("r", "x").with_keywords(["disk", "memory"]));
        assert!(rule.passes_prefilter("disk is full", PrefilterMode::Any));
        assert!(rule.passes_prefilter("out of memory", PrefilterMode::Any));
        assert!(!rule.passes_prefilter("all good", PrefilterMode::Any));
    }

    #[test]
    fn test_prefilter_all() {
        let rule = compile(RuleDefinition::new("r", "x").with_keywords(["disk", "full"]));
        assert!(rule.passes_prefilter("disk is full", PrefilterMode::All));
        assert!(!rule.passes_prefilter("disk is fine", PrefilterMode::All));
    }

    #[test]
    fn test_prefilter_empty_keywords_passes() {
        let rule = compile(RuleDefinition::new("r", "x"));
        assert!(rule.passes_prefilter("anything", PrefilterMode::Any));
        assert!(rule.passes_prefilter("anything", PrefilterMode::All));
    }

    #[test]
    fn test_check_short_circuits_on_prefilter() {
        let rule = compile(RuleDefinition::new("r", "timeout").with_keywords(["network"]));
        let line = "request timeout";
        assert_eq!(
            rule.check(line, &line.to_lowercase(), PrefilterMode::Any, 1024),
            MatchOutcome::NoMatch
        );
        let line = "network request timeout";
        assert_eq!(
            rule.check(line, &line.to_lowercase(), PrefilterMode::Any, 1024),
            MatchOutcome::Matched("timeout")
        );
    }

    #[test]
    fn test_long_line_is_skipped() {
        let rule = compile(RuleDefinition::new("r", "x"));
        let line = "x".repeat(32);
        assert_eq!(
            rule.evaluate(&line, 16),
            MatchOutcome::Skipped(SkipReason::LineTooLong {
                length: 32,
                limit: 16
            })
        );
    }

    #[test]
    fn test_compile_all_isolates_failures() {
        let definitions = vec![
            RuleDefinition::new("good one", "disk"),
            RuleDefinition::new("bad one", "(unclosed"),
            RuleDefinition::new("bad weight", "x").with_weight(500),
            RuleDefinition::new("good two", "memory"),
        ];
        let output = RuleCompiler::default().compile_all(&definitions);
        assert_eq!(output.rules.len(), 2);
        assert_eq!(output.rejected.len(), 2);
        assert_eq!(output.rejected[0].name, "bad one");
        assert!(matches!(
            output.rejected[0].error,
            RuleError::InvalidRegex { .. }
        ));
        assert!(matches!(
            output.rejected[1].error,
            RuleError::InvalidDefinition(_)
        ));
    }

    #[test]
    fn test_compile_all_skips_disabled() {
        let definitions = vec![
            RuleDefinition::new("on", "a"),
            RuleDefinition::new("off", "(").with_enabled(false),
        ];
        let output = RuleCompiler::default().compile_all(&definitions);
        assert_eq!(output.rules.len(), 1);
        assert!(output.rejected.is_empty());
    }

    #[test]
    fn test_compile_all_rejects_duplicates() {
        let definitions = vec![
            RuleDefinition::new("first", "a").with_id("same"),
            RuleDefinition::new("second", "b").with_id("same"),
        ];
        let output = RuleCompiler::default().compile_all(&definitions);
        assert_eq!(output.rules.len(), 1);
        assert_eq!(output.rules[0].name(), "first");
        assert_eq!(output.rejected.len(), 1);
    }

    #[test]
    fn test_compile_all_rank_order() {
        let definitions = vec![
            RuleDefinition::new("info", "a").with_severity(Severity::Info),
            RuleDefinition::new("err-low", "a").with_weight(10),
            RuleDefinition::new("crit", "a").with_severity(Severity::Critical),
            RuleDefinition::new("err-high", "a").with_weight(90),
        ];
        let output = RuleCompiler::default().compile_all(&definitions);
        let names: Vec<&str> = output.rules.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["crit", "err-high", "err-low", "info"]);
    }
}
