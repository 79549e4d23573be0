//! Analyze command implementation
//!
//! This module implements the `logsieve analyze` command, which:
//! - Loads configuration from logsieve.toml and applies flag overrides
//! - Assembles the rule source and builds the analyzer
//! - Expands paths into log inputs
//! - Analyzes each input and prints one report per input
//! - Returns an exit code reflecting the worst finding

use crate::cli::args::{AnalyzeArgs, ColorChoice, OutputFormat};
use crate::cli::common::{
    EXIT_CANCELLED, EXIT_ERROR, EXIT_FINDINGS, EXIT_PARSE_ERROR, EXIT_SUCCESS, LogInput,
    build_rule_source, color_option, discover_inputs, load_config,
};
use crate::config::{self, Config};
use crate::engine::{AnalysisReport, Analyzer, CancellationToken};
use crate::error::{AnalysisError, ConfigError, RuleSourceError};
use crate::input::FileWalkerError;
use crate::output::{HumanFormatter, JsonFormatter, JsonlFormatter, color_choice};
use std::path::Path;
use std::time::Duration;

/// Error type specific to analyze command
#[derive(Debug, thiserror::Error)]
pub(crate) enum AnalyzeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule source error: {0}")]
    RuleSource(#[from] RuleSourceError),

    #[error("File walker error: {0}")]
    FileWalker(#[from] FileWalkerError),

    #[error("Failed to read {source_name}: {error}")]
    Read {
        source_name: String,
        error: std::io::Error,
    },

    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the analyze command
///
/// # Returns
///
/// Exit code:
/// - 0: No group at or above the fail-on severity
/// - 1: At least one such group
/// - 2: Error (rule source, I/O, walking)
/// - 3: Parse error (invalid TOML configuration)
/// - 4: Cancelled by the timeout
pub fn run_analyze(config_path: Option<&Path>, color: Option<ColorChoice>, args: &AnalyzeArgs) -> i32 {
    match run_analyze_inner(config_path, color, args) {
        Ok(true) => EXIT_FINDINGS,
        Ok(false) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                AnalyzeError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
                AnalyzeError::Analysis(AnalysisError::Cancelled) => EXIT_CANCELLED,
                _ => EXIT_ERROR,
            }
        }
    }
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, args: &AnalyzeArgs) {
    if let Some(context) = args.context {
        config.analysis.context_size = usize::from(context);
    }
    if let Some(parallelism) = args.parallelism {
        config.analysis.parallelism = parallelism;
    }
    if let Some(format) = args.format {
        config.output.format = match format {
            OutputFormat::Human => config::OutputFormat::Human,
            OutputFormat::Json => config::OutputFormat::Json,
            OutputFormat::Jsonl => config::OutputFormat::Jsonl,
        };
    }
    if let Some(fail_on) = args.fail_on {
        config.output.fail_on = fail_on.into();
    }
}

/// Internal implementation; returns whether any report crossed the threshold
fn run_analyze_inner(
    config_path: Option<&Path>,
    color: Option<ColorChoice>,
    args: &AnalyzeArgs,
) -> Result<bool, AnalyzeError> {
    let mut loaded = load_config(config_path)?;
    apply_overrides(&mut loaded.config, args);
    let config = &loaded.config;

    let source = build_rule_source(&loaded, &args.rule_args);
    let analyzer = Analyzer::new(source, config.analysis.to_options());

    // Load rules up front so source errors surface before any input is read
    let rule_set = analyzer.rule_set()?;
    if rule_set.is_empty() {
        eprintln!("Warning: No rules are loaded. Nothing will match.");
    }

    let inputs = discover_inputs(&args.paths, config)?;
    if inputs.is_empty() {
        eprintln!("Warning: No log files found to analyze.");
        return Ok(false);
    }

    let cancel = match args.timeout {
        Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
        None => CancellationToken::new(),
    };

    let mut failed = false;
    for input in &inputs {
        let report = analyze_input(&analyzer, input, config, &cancel)?;
        print_report(&input.label(), &report, config, color)?;
        failed |= report.has_findings_at_least(config.output.fail_on);
    }

    Ok(failed)
}

fn analyze_input(
    analyzer: &Analyzer,
    input: &LogInput,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<AnalysisReport, AnalyzeError> {
    let lines = input
        .read_lines(config.input.log_text_options())
        .map_err(|error| AnalyzeError::Read {
            source_name: input.label(),
            error,
        })?;
    Ok(analyzer.analyze_with_cancel(&lines, cancel)?)
}

fn print_report(
    label: &str,
    report: &AnalysisReport,
    config: &Config,
    color: Option<ColorChoice>,
) -> Result<(), AnalyzeError> {
    match config.output.format {
        config::OutputFormat::Human => {
            let choice = color_choice(color_option(color, config));
            HumanFormatter::new().write_to_stdout(label, report, choice)?;
        }
        config::OutputFormat::Json => {
            println!("{}", JsonFormatter::new().format(label, report)?);
        }
        config::OutputFormat::Jsonl => {
            JsonlFormatter::new().write_to_stdout(label, report)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{RuleArgs, SeverityArg};
    use crate::types::Severity;

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            paths: vec![".".to_string()],
            rule_args: RuleArgs::default(),
            context: None,
            format: None,
            timeout: None,
            fail_on: None,
            parallelism: None,
        }
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &args());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        let args = AnalyzeArgs {
            context: Some(0),
            format: Some(OutputFormat::Json),
            fail_on: Some(SeverityArg::Critical),
            parallelism: Some(2),
            ..args()
        };
        apply_overrides(&mut config, &args);
        assert_eq!(config.analysis.context_size, 0);
        assert_eq!(config.analysis.parallelism, 2);
        assert_eq!(config.output.format, config::OutputFormat::Json);
        assert_eq!(config.output.fail_on, Severity::Critical);
    }
}
