//! Error types for logsieve
//!
//! This module defines the error types used throughout logsieve, following
//! a hierarchical structure with specific error variants for different
//! error categories.

use crate::types::RuleId;
use std::path::PathBuf;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration syntax
    #[error("Invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Rule-related errors
///
/// These are recoverable at the compiler boundary: the offending rule is
/// excluded and the rest of the set still compiles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// Invalid rule definition
    #[error("Invalid rule definition: {0}")]
    InvalidDefinition(String),

    /// Rule not found
    #[error("Rule not found: {0}")]
    NotFound(String),

    /// Invalid regex pattern
    #[error("Invalid regex pattern for rule '{rule_id}': {message}")]
    InvalidRegex { rule_id: RuleId, message: String },
}

/// Errors raised while fetching rule records from a rule source
#[derive(Debug, thiserror::Error)]
pub enum RuleSourceError {
    /// The backing store could not be reached or read
    #[error("Rule source unavailable: {0}")]
    Unavailable(String),

    /// A rule file could not be read
    #[error("Failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A rule file is not valid JSON or TOML
    #[error("Failed to parse rule file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Outcomes of an analysis call other than a complete report
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The rule cache could not be rebuilt
    #[error("Rule source error: {0}")]
    RuleSource(#[from] RuleSourceError),

    /// The caller cancelled the analysis or its deadline passed
    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Returns true if this is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled)
    }
}

/// Top-level error type for logsieve
#[derive(Debug, thiserror::Error)]
pub enum LogSieveError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule error
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Rule source error
    #[error("Rule source error: {0}")]
    RuleSource(#[from] RuleSourceError),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
