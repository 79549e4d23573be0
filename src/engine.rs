#![forbid(unsafe_code)]

//! Line matching, grouping, context extraction and ranking

pub mod aggregator;
pub mod analyzer;
pub mod cancel;
pub mod context;
pub mod matcher;
pub mod ranker;
pub mod stats;
pub mod validator;

pub use aggregator::{Aggregator, ErrorGroup, Occurrence};
pub use analyzer::{AnalysisReport, Analyzer, AnalyzerOptions};
pub use cancel::CancellationToken;
pub use context::{ContextLine, ContextWindow, DEFAULT_CONTEXT_SIZE, MAX_CONTEXT_SIZE, extract_context};
pub use matcher::{DEFAULT_MAX_LINE_LENGTH, MatchEngine, MatchRecord, ScanOutput};
pub use ranker::{compare_groups, rank_groups};
pub use stats::Stats;
pub use validator::{RuleMatch, RuleValidation, RuleValidator};
