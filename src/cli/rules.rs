//! Rules command implementation
//!
//! Lists every compiled rule in rank order, then every rule record that was
//! rejected during compilation together with the reason.

use crate::cli::args::{ListFormat, RuleArgs};
use crate::cli::common::{EXIT_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS, build_rule_source, load_config};
use crate::engine::Analyzer;
use crate::error::{ConfigError, RuleSourceError};
use crate::output::{RuleListHumanFormatter, RuleListJsonlFormatter, rule_entries};
use std::path::Path;

/// Error type specific to rules command
#[derive(Debug, thiserror::Error)]
enum RulesError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule source error: {0}")]
    RuleSource(#[from] RuleSourceError),
}

/// Run the rules command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 2: Error
/// - 3: Parse error (invalid TOML configuration)
pub fn run_rules(config_path: Option<&Path>, rule_args: &RuleArgs, format: ListFormat) -> i32 {
    match run_rules_inner(config_path, rule_args, format) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                RulesError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
                _ => EXIT_ERROR,
            }
        }
    }
}

fn run_rules_inner(
    config_path: Option<&Path>,
    rule_args: &RuleArgs,
    format: ListFormat,
) -> Result<(), RulesError> {
    let loaded = load_config(config_path)?;
    let source = build_rule_source(&loaded, rule_args);
    let analyzer = Analyzer::new(source, loaded.config.analysis.to_options());

    let rule_set = analyzer.rule_set()?;
    let entries = rule_entries(&rule_set);

    match format {
        ListFormat::Human => {
            if entries.is_empty() {
                println!("No rules are loaded.");
            } else {
                RuleListHumanFormatter::new().write_to_stdout(&entries);
            }
        }
        ListFormat::Jsonl => RuleListJsonlFormatter::new().write_to_stdout(&entries),
    }

    Ok(())
}
