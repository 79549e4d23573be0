#![forbid(unsafe_code)]

//! Analysis entry point
//!
//! The [`Analyzer`] owns the rule cache and the match engine. One call runs
//! the whole pipeline over a line sequence: scan, group, attach context,
//! rank and summarize. Analyzers are `Send + Sync`; concurrent calls share
//! only the cached rule set.

use crate::engine::aggregator::{Aggregator, ErrorGroup};
use crate::engine::cancel::CancellationToken;
use crate::engine::context::{DEFAULT_CONTEXT_SIZE, MAX_CONTEXT_SIZE};
use crate::engine::matcher::{DEFAULT_MAX_LINE_LENGTH, MatchEngine};
use crate::engine::ranker::rank_groups;
use crate::engine::stats::Stats;
use crate::engine::validator::{RuleValidation, RuleValidator};
use crate::error::{AnalysisError, RuleSourceError};
use crate::rules::{DEFAULT_RULE_CACHE_TTL, RuleCache, RuleCompiler, RuleDefinition, RuleSet, RuleSource};
use crate::types::{LineMatchMode, PrefilterMode, Severity};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables for an [`Analyzer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Context lines on each side of a match, clamped to 10
    pub context_size: usize,
    pub cache_ttl: Duration,
    pub prefilter: PrefilterMode,
    pub line_match: LineMatchMode,
    pub case_insensitive: bool,
    /// Scan shards; 0 sizes them from the rayon pool
    pub parallelism: usize,
    pub max_line_length: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            context_size: DEFAULT_CONTEXT_SIZE,
            cache_ttl: DEFAULT_RULE_CACHE_TTL,
            prefilter: PrefilterMode::default(),
            line_match: LineMatchMode::default(),
            case_insensitive: true,
            parallelism: 0,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Result of one analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Groups in importance order
    pub error_groups: Vec<ErrorGroup>,
    pub stats: Stats,
    pub total_lines: usize,
    /// Compiled rules the lines were scanned with
    pub rules_applied: usize,
    pub skipped_evaluations: usize,
    pub elapsed_ms: u64,
}

impl AnalysisReport {
    fn empty(elapsed: Duration) -> Self {
        Self {
            error_groups: Vec::new(),
            stats: Stats::default(),
            total_lines: 0,
            rules_applied: 0,
            skipped_evaluations: 0,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Returns true if any occurrence is at least as severe as `threshold`
    pub fn has_findings_at_least(&self, threshold: Severity) -> bool {
        self.stats.count_at_least(threshold) > 0
    }
}

/// Rule-matching analyzer over log lines
pub struct Analyzer {
    cache: RuleCache,
    compiler: RuleCompiler,
    engine: MatchEngine,
    context_size: usize,
}

impl Analyzer {
    /// Creates an analyzer reading rules from `source`
    ///
    /// No rules are loaded until the first analysis.
    pub fn new(source: Arc<dyn RuleSource>, options: AnalyzerOptions) -> Self {
        let compiler = RuleCompiler::new(options.case_insensitive);
        let engine = MatchEngine::new()
            .with_prefilter(options.prefilter)
            .with_line_match(options.line_match)
            .with_max_line_length(options.max_line_length)
            .with_parallelism(options.parallelism);

        Self {
            cache: RuleCache::new(source, compiler.clone(), options.cache_ttl),
            compiler,
            engine,
            context_size: options.context_size.min(MAX_CONTEXT_SIZE),
        }
    }

    /// Analyze `lines` with the current rule set
    ///
    /// # Arguments
    ///
    /// * `lines` - Prepared log lines; line numbers in the report are 1-based
    ///   positions in this slice
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::RuleSource` if the rule set has to be rebuilt
    /// and the source cannot be read.
    pub fn analyze<S>(&self, lines: &[S]) -> Result<AnalysisReport, AnalysisError>
    where
        S: AsRef<str> + Sync,
    {
        self.analyze_with_cancel(lines, &CancellationToken::new())
    }

    /// Like [`Analyzer::analyze`], but gives up once `cancel` trips
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if the token trips before the
    /// report is complete.
    pub fn analyze_with_cancel<S>(
        &self,
        lines: &[S],
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError>
    where
        S: AsRef<str> + Sync,
    {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        if lines.is_empty() {
            return Ok(AnalysisReport::empty(started.elapsed()));
        }

        let rule_set = self.cache.get()?;
        let report = self.run(&rule_set, lines, cancel, started)?;

        tracing::info!(
            lines = report.total_lines,
            rules = report.rules_applied,
            groups = report.stats.total_groups,
            occurrences = report.stats.total_occurrences,
            skipped = report.skipped_evaluations,
            elapsed_ms = report.elapsed_ms,
            "analysis complete"
        );

        Ok(report)
    }

    fn run<S>(
        &self,
        rule_set: &RuleSet,
        lines: &[S],
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<AnalysisReport, AnalysisError>
    where
        S: AsRef<str> + Sync,
    {
        let scan = self.engine.scan(lines, rule_set.rules(), cancel)?;
        tracing::debug!(records = scan.records.len(), "scan finished");

        let mut aggregator = Aggregator::new();
        aggregator.extend(scan.records);
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let mut groups = aggregator.finish(lines, self.context_size);
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        rank_groups(&mut groups);
        let stats = Stats::from_groups(&groups);

        Ok(AnalysisReport {
            error_groups: groups,
            stats,
            total_lines: lines.len(),
            rules_applied: rule_set.len(),
            skipped_evaluations: scan.skipped_evaluations,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Drop the cached rule set; the next analysis rebuilds it
    pub fn invalidate_rule_cache(&self) {
        self.cache.invalidate();
    }

    /// The current compiled rule set, rebuilding it if needed
    pub fn rule_set(&self) -> Result<Arc<RuleSet>, RuleSourceError> {
        self.cache.get()
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    pub fn context_size(&self) -> usize {
        self.context_size
    }

    /// Dry-run rule records against `lines`
    ///
    /// Each record is compiled and scanned independently of the cache, with
    /// this analyzer's matching options.
    pub fn validate_rules<S>(&self, definitions: &[RuleDefinition], lines: &[S]) -> Vec<RuleValidation>
    where
        S: AsRef<str> + Sync,
    {
        RuleValidator::new(self.compiler.clone(), self.engine.clone(), self.context_size)
            .validate_all(definitions, lines)
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("cache", &self.cache)
            .field("engine", &self.engine)
            .field("context_size", &self.context_size)
            .finish()
    }
}
