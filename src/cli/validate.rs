//! Validate command implementation
//!
//! Dry-runs rule records against one log and prints every match with its
//! context, or the reason a record failed to compile. Useful while writing
//! rules.

use crate::cli::args::{RuleArgs, ValidateFormat};
use crate::cli::common::{
    EXIT_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS, LogInput, build_rule_source, load_config,
};
use crate::engine::{Analyzer, RuleValidation};
use crate::error::{ConfigError, RuleError, RuleSourceError};
use crate::output::human::write_context;
use crate::rules::RuleDefinition;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use termcolor::NoColor;

/// Error type specific to validate command
#[derive(Debug, thiserror::Error)]
enum ValidateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule source error: {0}")]
    RuleSource(#[from] RuleSourceError),

    #[error("{0}")]
    Rule(#[from] RuleError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Run the validate command
///
/// # Returns
///
/// Exit code:
/// - 0: Every selected rule compiled (matched or not)
/// - 2: A rule failed to compile, an id was unknown, or another error
/// - 3: Parse error (invalid TOML configuration)
pub fn run_validate(
    config_path: Option<&Path>,
    log: &str,
    rule_ids: &[String],
    rule_args: &RuleArgs,
    format: ValidateFormat,
) -> i32 {
    match run_validate_inner(config_path, log, rule_ids, rule_args, format) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_ERROR,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                ValidateError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
                _ => EXIT_ERROR,
            }
        }
    }
}

/// Keep the records named in `rule_ids`, in the order given
fn select_rules(
    definitions: Vec<RuleDefinition>,
    rule_ids: &[String],
) -> Result<Vec<RuleDefinition>, RuleError> {
    if rule_ids.is_empty() {
        return Ok(definitions);
    }
    rule_ids
        .iter()
        .map(|wanted| {
            definitions
                .iter()
                .find(|d| d.resolved_id().is_some_and(|id| id.as_str() == wanted))
                .cloned()
                .ok_or_else(|| RuleError::NotFound(wanted.clone()))
        })
        .collect()
}

fn run_validate_inner(
    config_path: Option<&Path>,
    log: &str,
    rule_ids: &[String],
    rule_args: &RuleArgs,
    format: ValidateFormat,
) -> Result<bool, ValidateError> {
    let loaded = load_config(config_path)?;
    let source = build_rule_source(&loaded, rule_args);
    let definitions = select_rules(source.load_rules()?, rule_ids)?;

    let input = if log == "-" {
        LogInput::Stdin
    } else {
        LogInput::File(PathBuf::from(log))
    };
    let lines = input.read_lines(loaded.config.input.log_text_options())?;

    let analyzer = Analyzer::new(source, loaded.config.analysis.to_options());
    let results = analyzer.validate_rules(&definitions, &lines);

    match format {
        ValidateFormat::Human => {
            let mut stdout = NoColor::new(io::stdout().lock());
            write_human(&mut stdout, &input.label(), &results)?;
            stdout.flush()?;
        }
        ValidateFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }

    Ok(results.iter().all(|r| r.error.is_none()))
}

fn write_human<W: termcolor::WriteColor>(
    out: &mut W,
    label: &str,
    results: &[RuleValidation],
) -> io::Result<()> {
    for result in results {
        let id = result
            .rule_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("<no id>");
        match &result.error {
            Some(error) => writeln!(out, "{} ({}): error: {}", id, result.rule_name, error)?,
            None => writeln!(
                out,
                "{} ({}): {} match(es) in {}",
                id, result.rule_name, result.match_count, label
            )?,
        }
        for found in &result.matches {
            writeln!(out, "  line {}: {}", found.line_number, found.matched_text)?;
            write_context(out, &found.context)?;
        }
    }
    Ok(())
}
