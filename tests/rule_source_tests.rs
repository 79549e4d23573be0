//! Tests for loading rule records from files and layering sources

mod common;

use common::{rule_toml, write_file};
use logsieve::engine::{Analyzer, AnalyzerOptions};
use logsieve::rules::{
    BuiltinRuleSource, FileRuleSource, LayeredRuleSource, MemoryRuleSource, RuleDefinition,
    RuleSource,
};
use logsieve::{RuleSourceError, Severity};
use std::sync::Arc;
use tempfile::TempDir;

const SEED_JSON: &str = r#"[
  {
    "id": "oom",
    "name": "Out of memory",
    "regex": "out of memory",
    "keywords": ["Memory"],
    "severity": "CRITICAL",
    "weight": 90,
    "solution": "Raise the limit"
  },
  {
    "name": "Connection reset",
    "pattern": "connection reset",
    "severity": "warning"
  },
  {
    "name": 42
  }
]"#;

#[test]
fn test_json_seed_file_skips_malformed_records() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "rules.json", SEED_JSON);

    let rules = assert_ok!(FileRuleSource::new(path).load_rules());

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].pattern, "out of memory");
    assert_eq!(rules[0].weight, 90);
    assert_eq!(
        assert_some!(rules[1].resolved_id()).as_str(),
        "connection-reset"
    );
    assert_eq!(rules[1].weight, 50);
    assert!(rules[1].enabled);
}

#[test]
fn test_json_seed_file_drives_analysis() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "rules.json", SEED_JSON);
    let analyzer = Analyzer::new(Arc::new(FileRuleSource::new(path)), AnalyzerOptions::default());

    let report = assert_ok!(analyzer.analyze(&[
        "kernel: Out Of Memory",
        "peer: connection reset by peer",
    ]));

    assert_eq!(report.error_groups.len(), 2);
    assert_eq!(report.error_groups[0].rule_id.as_str(), "oom");
    assert_eq!(report.error_groups[0].severity, Severity::Critical);
    assert_eq!(report.error_groups[1].severity, Severity::Warning);
}

#[test]
fn test_invalid_json_document_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "rules.json", "{ not json");

    let err = FileRuleSource::new(path).load_rules().unwrap_err();
    assert!(matches!(err, RuleSourceError::Parse { .. }));
}

#[test]
fn test_missing_path_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = FileRuleSource::new(temp.path().join("absent.json"))
        .load_rules()
        .unwrap_err();
    assert!(matches!(err, RuleSourceError::Io { .. }));
}

#[test]
fn test_rule_directory_in_file_name_order() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("rules");
    write_file(&dir, "b-timeout.toml", &rule_toml("timeout", "warning", "timed out", &["timed"]));
    write_file(&dir, "a-disk.toml", &rule_toml("disk", "error", "no space left", &["space"]));
    write_file(&dir, "c-broken.toml", "this is not a rule");
    write_file(&dir, "notes.md", "ignored");

    let rules = assert_ok!(FileRuleSource::new(&dir).load_rules());

    let ids: Vec<String> = rules
        .iter()
        .map(|r| assert_some!(r.resolved_id()).to_string())
        .collect();
    assert_eq!(ids, vec!["disk", "timeout"]);
    assert_eq!(rules[0].keywords, vec!["space"]);
}

#[test]
fn test_later_layer_overrides_builtin_rule() {
    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "overrides.toml",
        &rule_toml("timeout", "critical", "timed out", &["timed"]),
    );

    let source = LayeredRuleSource::new()
        .with_layer(BuiltinRuleSource)
        .with_layer(FileRuleSource::new(path));
    let builtin_count = assert_ok!(BuiltinRuleSource.load_rules()).len();
    let rules = assert_ok!(source.load_rules());

    assert_eq!(rules.len(), builtin_count);
    let timeout = assert_some!(
        rules
            .iter()
            .find(|r| r.resolved_id().is_some_and(|id| id.as_str() == "timeout"))
    );
    assert_eq!(timeout.severity, "critical");
}

#[test]
fn test_layer_can_disable_rule() {
    let base = MemoryRuleSource::with_rules(vec![RuleDefinition::new("Noise", "noise")]);
    let overrides =
        MemoryRuleSource::with_rules(vec![RuleDefinition::new("Noise", "noise").with_enabled(false)]);
    let source = LayeredRuleSource::new().with_layer(base).with_layer(overrides);

    let analyzer = Analyzer::new(Arc::new(source), AnalyzerOptions::default());
    let report = assert_ok!(analyzer.analyze(&["noise"]));
    assert!(report.error_groups.is_empty());
    assert_eq!(report.rules_applied, 0);
}

#[test]
fn test_builtin_rules_all_compile() {
    let analyzer = Analyzer::new(Arc::new(BuiltinRuleSource), AnalyzerOptions::default());
    let rule_set = assert_ok!(analyzer.rule_set());

    assert!(rule_set.rejected().is_empty());
    assert_eq!(rule_set.len(), assert_ok!(BuiltinRuleSource.load_rules()).len());
    assert!(!rule_set.is_empty());
}

#[test]
fn test_memory_source_versions() {
    let source = MemoryRuleSource::new();
    assert_eq!(source.upsert(RuleDefinition::new("Disk", "disk")), 1);
    assert_eq!(source.upsert(RuleDefinition::new("Disk", "disk full")), 2);
    assert_eq!(source.len(), 1);

    let id = assert_some!(logsieve::RuleId::new("disk"));
    assert!(source.set_enabled(&id, false));
    assert_eq!(assert_some!(source.get(&id)).version, 3);
    assert!(source.remove(&id));
    assert!(source.is_empty());
}
