//! Configuration file parsing and validation

pub mod logsieve_toml;

pub use logsieve_toml::{
    AnalysisConfig, CONFIG_FILE_NAME, ColorOption, Config, InputConfig, OutputConfig,
    OutputFormat, RulesConfig,
};
