#![forbid(unsafe_code)]

//! logsieve: find, group and rank known error patterns in log output
//!
//! A rule set of regular expressions, each guarded by a cheap keyword
//! pre-filter, is compiled once and cached. Analyses scan log lines against
//! it, group matches by rule and line text, attach surrounding context and
//! rank the groups by severity, weight and frequency.
//!
//! ```no_run
//! use logsieve::engine::{Analyzer, AnalyzerOptions};
//! use logsieve::rules::BuiltinRuleSource;
//! use std::sync::Arc;
//!
//! let analyzer = Analyzer::new(Arc::new(BuiltinRuleSource), AnalyzerOptions::default());
//! let report = analyzer.analyze(&["kernel: Out of memory: Killed process 4242"])?;
//! for group in &report.error_groups {
//!     println!("[{}] {} x{}", group.severity, group.rule_name, group.count);
//! }
//! # Ok::<(), logsieve::AnalysisError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod rules;
pub mod types;

// Re-export error types for convenient access
pub use error::{AnalysisError, ConfigError, LogSieveError, RuleError, RuleSourceError};

// Re-export core domain types for convenient access
pub use types::{GlobPattern, LineMatchMode, PrefilterMode, RuleId, Severity};
