//! Parsing and validation for logsieve.toml configuration files

use crate::engine::{AnalyzerOptions, DEFAULT_CONTEXT_SIZE, DEFAULT_MAX_LINE_LENGTH, MAX_CONTEXT_SIZE};
use crate::error::ConfigError;
use crate::input::LogTextOptions;
use crate::rules::DEFAULT_RULE_CACHE_TTL;
use crate::types::{GlobPattern, LineMatchMode, PrefilterMode, Severity};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "logsieve.toml";

/// Main configuration struct for logsieve.toml
///
/// Every section and field is optional; an empty file is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, otherwise return the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.context_size > MAX_CONTEXT_SIZE {
            return Err(ConfigError::Validation(format!(
                "context_size must be between 0 and {}, got {}",
                MAX_CONTEXT_SIZE, self.analysis.context_size
            )));
        }

        if self.analysis.max_line_length == 0 {
            return Err(ConfigError::Validation(
                "max_line_length must be greater than 0".to_string(),
            ));
        }

        // Validate glob patterns by attempting to compile them with globset
        for pattern in &self.input.include {
            globset::Glob::new(pattern.as_str()).map_err(|e| {
                ConfigError::Validation(format!(
                    "Invalid include glob pattern '{}': {}",
                    pattern.as_str(),
                    e
                ))
            })?;
        }

        for pattern in &self.input.exclude {
            globset::Glob::new(pattern.as_str()).map_err(|e| {
                ConfigError::Validation(format!(
                    "Invalid exclude glob pattern '{}': {}",
                    pattern.as_str(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}

/// `[analysis]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub context_size: usize,
    pub cache_ttl_secs: u64,
    pub prefilter: PrefilterMode,
    pub line_match: LineMatchMode,
    pub case_insensitive: bool,
    /// 0 sizes the scan from the thread pool
    pub parallelism: usize,
    pub max_line_length: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context_size: DEFAULT_CONTEXT_SIZE,
            cache_ttl_secs: DEFAULT_RULE_CACHE_TTL.as_secs(),
            prefilter: PrefilterMode::default(),
            line_match: LineMatchMode::default(),
            case_insensitive: true,
            parallelism: 0,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl AnalysisConfig {
    pub fn to_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            context_size: self.context_size,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            prefilter: self.prefilter,
            line_match: self.line_match,
            case_insensitive: self.case_insensitive,
            parallelism: self.parallelism,
            max_line_length: self.max_line_length,
        }
    }
}

/// `[rules]` section: where rule records come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Include the embedded built-in rules
    pub builtin: bool,
    /// Rule files or directories, layered in order over the built-ins.
    /// Relative paths resolve against the configuration file's directory.
    pub paths: Vec<PathBuf>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            paths: vec![PathBuf::from("rules")],
        }
    }
}

/// `[input]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Patterns applied when walking directories (empty means all files)
    pub include: Vec<GlobPattern>,
    pub exclude: Vec<GlobPattern>,
    pub collapse_repeated_lines: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            include: vec![
                GlobPattern::new("**/*.log"),
                GlobPattern::new("**/*.txt"),
                GlobPattern::new("**/*.out"),
            ],
            exclude: Vec::new(),
            collapse_repeated_lines: false,
        }
    }
}

impl InputConfig {
    pub fn log_text_options(&self) -> LogTextOptions {
        LogTextOptions {
            collapse_repeated_lines: self.collapse_repeated_lines,
        }
    }
}

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Color output setting
    #[serde(default)]
    pub color: ColorOption,

    /// Lowest severity that makes `analyze` exit with findings
    #[serde(
        default = "default_fail_on",
        serialize_with = "serialize_severity",
        deserialize_with = "deserialize_severity"
    )]
    pub fail_on: Severity,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: ColorOption::Auto,
            fail_on: default_fail_on(),
        }
    }
}

fn default_fail_on() -> Severity {
    Severity::Error
}

fn serialize_severity<S: Serializer>(severity: &Severity, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&severity.as_str().to_lowercase())
}

fn deserialize_severity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Severity, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// One pretty-printed JSON document per input
    Json,
    /// JSON Lines format
    Jsonl,
}

/// Color output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorOption {
    /// Auto-detect based on terminal capabilities
    #[default]
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}
