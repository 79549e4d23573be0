//! Test utilities for logsieve integration tests
#![allow(dead_code)]

use logsieve::rules::RuleDefinition;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Extract Some value or panic with context
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(v) => v,
            None => panic!("assertion failed: expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(v) => v,
            None => panic!("{}: got None", $msg),
        }
    };
}

/// A build log touching several built-in rules
pub const BUILD_LOG: &str = "\
Compiling app v0.1.0
warning: `foo` is deprecated
error: linking failed
thread 'main' panicked at src/main.rs:10:5
kernel: Out of memory: Killed process 4242 (app)
Compiling app v0.1.0
request timed out after 30s
request timed out after 30s
done
";

/// Write `content` to `dir/name`, creating parent directories
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// A TOML rule file body
pub fn rule_toml(id: &str, severity: &str, pattern: &str, keywords: &[&str]) -> String {
    let keywords = keywords
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "[rule]\nid = \"{id}\"\nname = \"{id}\"\nseverity = \"{severity}\"\n\n[match]\npattern = '{pattern}'\nkeywords = [{keywords}]\n"
    )
}

/// The three rules used by the end-to-end scenarios
pub fn scenario_rules() -> Vec<RuleDefinition> {
    use logsieve::Severity;
    vec![
        RuleDefinition::new("OOM", "out of memory")
            .with_id("oom")
            .with_keywords(["memory"])
            .with_severity(Severity::Critical)
            .with_weight(90)
            .with_solution("Raise the memory limit"),
        RuleDefinition::new("Disk", "no space left")
            .with_id("disk")
            .with_keywords(["space"])
            .with_severity(Severity::Error)
            .with_weight(70),
        RuleDefinition::new("Timeout", "timed out")
            .with_id("timeout")
            .with_keywords(["timed"])
            .with_severity(Severity::Warning)
            .with_weight(40),
    ]
}
