//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// One JSON document per input
    Json,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Human,
    Jsonl,
}

/// Output format for rule validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidateFormat {
    Human,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Automatically detect if terminal supports color
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}

/// Severity threshold for the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Critical,
    Error,
    Warning,
    Info,
}

/// logsieve CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "logsieve")]
#[command(about = "Find, group and rank known error patterns in log output")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./logsieve.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output coloring (overrides the configuration file)
    #[arg(long, global = true)]
    pub color: Option<ColorChoice>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Rule selection flags shared by several commands
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleArgs {
    /// Extra rule files or directories, layered over the configured rules
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Vec<PathBuf>,

    /// Do not load the built-in rules
    #[arg(long)]
    pub no_builtin: bool,
}

/// Arguments of `logsieve analyze`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeArgs {
    /// Log files or directories to analyze; `-` reads stdin
    #[arg(default_value = ".")]
    pub paths: Vec<String>,

    #[command(flatten)]
    pub rule_args: RuleArgs,

    /// Context lines around each match (0-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub context: Option<u8>,

    /// Output format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with code 1 when a group at or above this severity is found
    #[arg(long)]
    pub fail_on: Option<SeverityArg>,

    /// Number of scan shards (0 = automatic)
    #[arg(long)]
    pub parallelism: Option<usize>,
}

/// Available logsieve subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze log files and report grouped, ranked findings
    Analyze(AnalyzeArgs),

    /// List the compiled rules and any rejected rule records
    Rules {
        #[command(flatten)]
        rule_args: RuleArgs,

        /// Output format
        #[arg(short, long, default_value = "human")]
        format: ListFormat,
    },

    /// Dry-run rules against a log file and show every match
    Validate {
        /// Log file to test against; `-` reads stdin
        log: String,

        /// Only validate these rule ids (all rules if omitted)
        #[arg(long = "rule", value_name = "ID")]
        rule_ids: Vec<String>,

        #[command(flatten)]
        rule_args: RuleArgs,

        /// Output format
        #[arg(short, long, default_value = "human")]
        format: ValidateFormat,
    },

    /// Write a default logsieve.toml and rules directory
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}
