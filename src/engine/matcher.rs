#![forbid(unsafe_code)]

//! Line scanning with keyword pre-filtering
//!
//! The [`MatchEngine`] walks the line sequence and, for every line, tries the
//! compiled rules in rank order: keyword pre-filter first, the regex only if
//! the pre-filter passes. Large inputs are split into contiguous shards and
//! scanned on the rayon pool; shard outputs are concatenated in shard order,
//! so the record stream is the same for any shard count.

use crate::engine::cancel::CancellationToken;
use crate::error::AnalysisError;
use crate::rules::{CompiledRule, MatchOutcome, SkipReason};
use crate::types::{LineMatchMode, PrefilterMode, RuleId};
use rayon::prelude::*;

/// Lines longer than this are not handed to the pattern engine by default
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Automatic sharding never creates shards smaller than this
pub const MIN_LINES_PER_SHARD: usize = 512;

/// Lines between two cancellation checks
const CANCEL_POLL_INTERVAL: usize = 256;

/// One successful pattern match at one line
#[derive(Debug, Clone, Copy)]
pub struct MatchRecord<'a> {
    pub rule: &'a CompiledRule,
    /// 1-based line number
    pub line_number: usize,
    pub raw_line: &'a str,
    pub matched_text: &'a str,
}

impl MatchRecord<'_> {
    pub fn rule_id(&self) -> &RuleId {
        self.rule.id()
    }
}

/// Records produced by a scan plus evaluation bookkeeping
#[derive(Debug, Default)]
pub struct ScanOutput<'a> {
    pub records: Vec<MatchRecord<'a>>,
    /// Rule/line evaluations that were skipped instead of executed
    pub skipped_evaluations: usize,
}

/// Scans lines against a compiled rule set
#[derive(Debug, Clone)]
pub struct MatchEngine {
    prefilter: PrefilterMode,
    line_match: LineMatchMode,
    max_line_length: usize,
    parallelism: usize,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self {
            prefilter: PrefilterMode::default(),
            line_match: LineMatchMode::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            parallelism: 0,
        }
    }

    pub fn with_prefilter(mut self, prefilter: PrefilterMode) -> Self {
        self.prefilter = prefilter;
        self
    }

    pub fn with_line_match(mut self, line_match: LineMatchMode) -> Self {
        self.line_match = line_match;
        self
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Number of shards to scan with; 0 sizes shards from the rayon pool
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn prefilter(&self) -> PrefilterMode {
        self.prefilter
    }

    pub fn line_match(&self) -> LineMatchMode {
        self.line_match
    }

    /// Scan every line against every rule
    ///
    /// `rules` should be in rank order; with [`LineMatchMode::FirstMatch`]
    /// the first matching rule in that order wins the line.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if `cancel` trips during the scan.
    /// No partial output is returned in that case.
    pub fn scan<'a, S>(
        &self,
        lines: &'a [S],
        rules: &'a [CompiledRule],
        cancel: &CancellationToken,
    ) -> Result<ScanOutput<'a>, AnalysisError>
    where
        S: AsRef<str> + Sync,
    {
        if lines.is_empty() || rules.is_empty() {
            return Ok(ScanOutput::default());
        }

        let shards = self.shard_count(lines.len());
        if shards <= 1 {
            return self.scan_shard(lines, 0, rules, cancel);
        }

        let chunk_size = lines.len().div_ceil(shards);
        let parts: Vec<ScanOutput<'a>> = lines
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(index, chunk)| self.scan_shard(chunk, index * chunk_size, rules, cancel))
            .collect::<Result<_, _>>()?;

        let mut output = ScanOutput {
            records: Vec::with_capacity(parts.iter().map(|p| p.records.len()).sum()),
            skipped_evaluations: 0,
        };
        for part in parts {
            output.records.extend(part.records);
            output.skipped_evaluations += part.skipped_evaluations;
        }
        Ok(output)
    }

    fn shard_count(&self, line_count: usize) -> usize {
        let requested = if self.parallelism == 0 {
            rayon::current_num_threads().min(line_count.div_ceil(MIN_LINES_PER_SHARD))
        } else {
            self.parallelism
        };
        requested.clamp(1, line_count.max(1))
    }

    fn scan_shard<'a, S>(
        &self,
        lines: &'a [S],
        offset: usize,
        rules: &'a [CompiledRule],
        cancel: &CancellationToken,
    ) -> Result<ScanOutput<'a>, AnalysisError>
    where
        S: AsRef<str>,
    {
        let needs_lowered = rules.iter().any(|r| !r.keywords().is_empty());
        let mut output = ScanOutput::default();

        for (index, line) in lines.iter().enumerate() {
            if index % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let line = line.as_ref();
            let line_number = offset + index + 1;
            let lowered = if needs_lowered {
                line.to_lowercase()
            } else {
                String::new()
            };

            for rule in rules {
                match rule.check(line, &lowered, self.prefilter, self.max_line_length) {
                    MatchOutcome::Matched(matched_text) => {
                        output.records.push(MatchRecord {
                            rule,
                            line_number,
                            raw_line: line,
                            matched_text,
                        });
                        if self.line_match == LineMatchMode::FirstMatch {
                            break;
                        }
                    }
                    MatchOutcome::NoMatch => {}
                    MatchOutcome::Skipped(SkipReason::LineTooLong { length, limit }) => {
                        output.skipped_evaluations += 1;
                        tracing::debug!(
                            rule_id = %rule.id(),
                            line_number,
                            length,
                            limit,
                            "skipping pattern evaluation for oversized line"
                        );
                    }
                }
            }
        }

        Ok(output)
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}
