//! Initialize a logsieve project
//!
//! Creates a default configuration file and a rules directory holding an
//! example rule file.

use std::fs;
use std::path::Path;

/// Default content for logsieve.toml
const DEFAULT_LOGSIEVE_TOML: &str = r#"# logsieve configuration

[analysis]
# Context lines shown around each match (0-10)
context_size = 3
# Seconds before the compiled rule set is rebuilt from its sources
cache_ttl_secs = 300
# Keyword pre-filter: "any" keyword or "all" keywords must occur in a line
prefilter = "any"
# "all-rules" reports every matching rule per line, "first-match" only the
# highest ranked one
line_match = "all-rules"
case_insensitive = true
# Scan shards; 0 sizes them from the available cores
parallelism = 0
# Longer lines are not handed to the pattern engine
max_line_length = 65536

[rules]
# Embedded default rules
builtin = true
# Rule files and directories, relative to this file
paths = ["rules"]

[input]
# Patterns applied when a directory is analyzed
include = ["**/*.log", "**/*.txt", "**/*.out"]
exclude = []
collapse_repeated_lines = false

[output]
format = "human"
color = "auto"
# analyze exits with code 1 when a group at or above this severity is found
fail_on = "error"
"#;

/// Example rule written to rules/example.toml
const EXAMPLE_RULE_TOML: &str = r#"# Example rule. Set enabled = true (or copy this file) to use it.

[rule]
id = "example-rule"
name = "Example rule"
severity = "WARNING"
weight = 50
solution = "Describe how to fix the problem this rule detects."
categories = ["example"]
enabled = false

[match]
# Regular expression tested against each line (case-insensitive by default)
pattern = "something went wrong"
# The pattern is only tried on lines containing one of these words
keywords = ["wrong"]
"#;

/// Error type for init command
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path error
    #[error("Path error: {0}")]
    Path(String),
}

/// Result of init command
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InitResult {
    /// Files that were created
    pub created: Vec<String>,
    /// Files that were skipped (already existed)
    pub skipped: Vec<String>,
    /// Files that were overwritten
    pub overwritten: Vec<String>,
}

/// Run the init command in the current directory
pub fn run_init(force: bool) -> Result<InitResult, InitError> {
    run_init_in(Path::new("."), force)
}

/// Run the init command under `root`
///
/// Creates:
/// - logsieve.toml (configuration)
/// - rules/ (directory for rule files)
/// - rules/example.toml (a disabled example rule)
///
/// # Arguments
/// * `root` - Directory to initialize
/// * `force` - If true, overwrite existing files. If false, skip existing files.
pub fn run_init_in(root: &Path, force: bool) -> Result<InitResult, InitError> {
    let mut result = InitResult::default();

    handle_file(root, "logsieve.toml", DEFAULT_LOGSIEVE_TOML, force, &mut result)?;
    create_directory(root, "rules", &mut result)?;
    handle_file(root, "rules/example.toml", EXAMPLE_RULE_TOML, force, &mut result)?;

    Ok(result)
}

/// Handle creation of a single file
fn handle_file(
    root: &Path,
    name: &str,
    content: &str,
    force: bool,
    result: &mut InitResult,
) -> Result<(), InitError> {
    let path = root.join(name);

    if path.exists() {
        if force {
            fs::write(&path, content)?;
            result.overwritten.push(name.to_string());
        } else {
            result.skipped.push(name.to_string());
        }
    } else {
        fs::write(&path, content)?;
        result.created.push(name.to_string());
    }

    Ok(())
}

/// Create a directory if it doesn't exist
fn create_directory(root: &Path, name: &str, result: &mut InitResult) -> Result<(), InitError> {
    let path = root.join(name);

    if path.exists() {
        if path.is_dir() {
            Ok(())
        } else {
            Err(InitError::Path(format!(
                "Path '{}' exists but is not a directory",
                name
            )))
        }
    } else {
        fs::create_dir_all(&path)?;
        result.created.push(format!("{}/", name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rules::RuleDefinition;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_all_files() {
        let temp = TempDir::new().unwrap();
        let result = run_init_in(temp.path(), false).expect("init should succeed");

        assert_eq!(
            result.created,
            vec!["logsieve.toml", "rules/", "rules/example.toml"]
        );
        assert!(result.skipped.is_empty());
        assert!(result.overwritten.is_empty());
        assert!(temp.path().join("rules").is_dir());
    }

    #[test]
    fn test_init_skips_existing_files_without_force() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("logsieve.toml"), "existing content").unwrap();

        let result = run_init_in(temp.path(), false).expect("init should succeed");

        assert!(result.skipped.contains(&"logsieve.toml".to_string()));
        let content = fs::read_to_string(temp.path().join("logsieve.toml")).unwrap();
        assert_eq!(content, "existing content");
        assert!(result.created.contains(&"rules/example.toml".to_string()));
    }

    #[test]
    fn test_init_overwrites_existing_files_with_force() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("logsieve.toml"), "old content").unwrap();

        let result = run_init_in(temp.path(), true).expect("init should succeed");

        assert!(result.overwritten.contains(&"logsieve.toml".to_string()));
        let content = fs::read_to_string(temp.path().join("logsieve.toml")).unwrap();
        assert!(content.contains("[analysis]"));
    }

    #[test]
    fn test_init_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let first = run_init_in(temp.path(), false).unwrap();
        assert_eq!(first.created.len(), 3);

        let second = run_init_in(temp.path(), false).unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped, vec!["logsieve.toml", "rules/example.toml"]);
    }

    #[test]
    fn test_init_error_when_rules_is_a_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("rules"), "not a directory").unwrap();

        let err = run_init_in(temp.path(), false).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config = Config::parse(DEFAULT_LOGSIEVE_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_example_rule_parses_and_is_disabled() {
        let rule = RuleDefinition::from_toml(EXAMPLE_RULE_TOML).unwrap();
        assert!(!rule.enabled);
        assert!(rule.validate().is_ok());
    }
}
