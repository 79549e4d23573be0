//! Common helper functions shared across CLI commands
//!
//! This module provides shared functionality for loading configuration,
//! assembling the rule source, and reading log inputs.

use crate::cli::args::{ColorChoice, RuleArgs, SeverityArg};
use crate::config::{CONFIG_FILE_NAME, ColorOption, Config};
use crate::error::ConfigError;
use crate::input::{self, FileWalkerError, LogTextOptions};
use crate::rules::{BuiltinRuleSource, FileRuleSource, LayeredRuleSource, RuleSource};
use crate::types::Severity;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;
pub const EXIT_CANCELLED: i32 = 4;

/// Name used for stdin in reports
pub const STDIN_LABEL: &str = "<stdin>";

/// Install the tracing subscriber for the binary
///
/// `RUST_LOG` wins when set; otherwise the level follows `-v` (warn, info,
/// debug). Logs go to stderr so reports on stdout stay machine-readable.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// A loaded configuration and the directory relative rule paths resolve against
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub base_dir: PathBuf,
}

/// Load logsieve.toml
///
/// An explicitly given path must exist. Without one, `./logsieve.toml` is used
/// if present and the defaults otherwise.
///
/// # Errors
///
/// Returns `ConfigError::Io` if the file cannot be read.
/// Returns `ConfigError::Parse` if the file is invalid TOML.
pub(crate) fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (config, config_path) = match path {
        Some(path) => (Config::load(path)?, path.to_path_buf()),
        None => {
            let path = PathBuf::from(CONFIG_FILE_NAME);
            (Config::load_or_default(&path)?, path)
        }
    };

    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedConfig { config, base_dir })
}

/// Build the layered rule source: built-ins, configured paths, then `--rules`
///
/// Configured paths that do not exist are skipped; paths given on the command
/// line are used as-is and fail the load if missing.
pub(crate) fn build_rule_source(loaded: &LoadedConfig, rule_args: &RuleArgs) -> Arc<dyn RuleSource> {
    let mut source = LayeredRuleSource::new();

    if loaded.config.rules.builtin && !rule_args.no_builtin {
        source.push(Box::new(BuiltinRuleSource));
    }

    for path in &loaded.config.rules.paths {
        let resolved = if path.is_absolute() {
            path.clone()
        } else {
            loaded.base_dir.join(path)
        };
        if resolved.exists() {
            source.push(Box::new(FileRuleSource::new(resolved)));
        } else {
            tracing::info!(path = %resolved.display(), "configured rule path not found, skipping");
        }
    }

    for path in &rule_args.rules {
        source.push(Box::new(FileRuleSource::new(path.clone())));
    }

    tracing::debug!(layers = source.len(), "assembled rule source");
    Arc::new(source)
}

/// One log input named on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogInput {
    Stdin,
    File(PathBuf),
}

impl LogInput {
    pub(crate) fn label(&self) -> String {
        match self {
            LogInput::Stdin => STDIN_LABEL.to_string(),
            LogInput::File(path) => path.display().to_string(),
        }
    }

    pub(crate) fn read_lines(&self, options: LogTextOptions) -> io::Result<Vec<String>> {
        match self {
            LogInput::Stdin => input::read_log(io::stdin().lock(), options),
            LogInput::File(path) => input::read_log_file(path, options),
        }
    }
}

/// Expand command-line paths into log inputs
///
/// `-` is stdin; files are taken as given; directories are walked with the
/// configured include/exclude patterns.
pub(crate) fn discover_inputs(
    paths: &[String],
    config: &Config,
) -> Result<Vec<LogInput>, FileWalkerError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path == "-" {
            inputs.push(LogInput::Stdin);
            continue;
        }
        let files = input::discover_log_files(
            &[PathBuf::from(path)],
            &config.input.include,
            &config.input.exclude,
        )?;
        inputs.extend(files.into_iter().map(LogInput::File));
    }
    Ok(inputs)
}

pub(crate) fn color_option(choice: Option<ColorChoice>, config: &Config) -> ColorOption {
    match choice {
        Some(ColorChoice::Auto) => ColorOption::Auto,
        Some(ColorChoice::Always) => ColorOption::Always,
        Some(ColorChoice::Never) => ColorOption::Never,
        None => config.output.color,
    }
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Critical => Severity::Critical,
            SeverityArg::Error => Severity::Error,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Info => Severity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn loaded(config: Config, base_dir: &Path) -> LoadedConfig {
        LoadedConfig {
            config,
            base_dir: base_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_load_config_explicit_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_explicit_file_sets_base_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[analysis]\ncontext_size = 1\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.config.analysis.context_size, 1);
        assert_eq!(loaded.base_dir, temp.path());
    }

    #[test]
    fn test_rule_source_layers() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("rules")).unwrap();
        fs::write(
            temp.path().join("rules/custom.toml"),
            "[rule]\nname = \"Custom\"\n\n[match]\npattern = \"custom failure\"\n",
        )
        .unwrap();

        let source = build_rule_source(&loaded(Config::default(), temp.path()), &RuleArgs::default());
        let rules = source.load_rules().unwrap();
        assert!(rules.iter().any(|r| r.name == "Custom"));
        assert!(rules.iter().any(|r| r.resolved_id().unwrap().as_str() == "out-of-memory"));

        let no_builtin = RuleArgs {
            rules: Vec::new(),
            no_builtin: true,
        };
        let rules = build_rule_source(&loaded(Config::default(), temp.path()), &no_builtin)
            .load_rules()
            .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_missing_configured_rule_path_is_skipped() {
        let temp = TempDir::new().unwrap();
        let args = RuleArgs {
            rules: Vec::new(),
            no_builtin: true,
        };
        let rules = build_rule_source(&loaded(Config::default(), temp.path()), &args)
            .load_rules()
            .unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_missing_cli_rule_path_fails() {
        let temp = TempDir::new().unwrap();
        let args = RuleArgs {
            rules: vec![temp.path().join("nope.json")],
            no_builtin: true,
        };
        let result = build_rule_source(&loaded(Config::default(), temp.path()), &args).load_rules();
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_inputs_with_stdin_and_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.log"), "x").unwrap();
        fs::write(temp.path().join("b.bin"), "x").unwrap();

        let paths = vec!["-".to_string(), temp.path().display().to_string()];
        let inputs = discover_inputs(&paths, &Config::default()).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0], LogInput::Stdin);
        assert_eq!(inputs[0].label(), STDIN_LABEL);
        assert_eq!(inputs[1], LogInput::File(temp.path().join("a.log")));
    }

    #[test]
    fn test_color_option_prefers_flag() {
        let config = Config::default();
        assert_eq!(color_option(None, &config), ColorOption::Auto);
        assert_eq!(color_option(Some(ColorChoice::Never), &config), ColorOption::Never);
    }
}
