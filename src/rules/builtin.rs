#![forbid(unsafe_code)]

//! Built-in rules embedded at compile time
//!
//! The rule files under `builtin-rules/` are compiled into the binary using
//! `include_str!`, so the analyzer works without any external rule files.

use crate::rules::rule::RuleDefinition;

/// Embedded built-in rule files
const BUILTIN_RULES: &[(&str, &str)] = &[
    (
        "out-of-memory",
        include_str!("../../builtin-rules/out-of-memory.toml"),
    ),
    ("segfault", include_str!("../../builtin-rules/segfault.toml")),
    ("panic", include_str!("../../builtin-rules/panic.toml")),
    ("disk-full", include_str!("../../builtin-rules/disk-full.toml")),
    (
        "build-failed",
        include_str!("../../builtin-rules/build-failed.toml"),
    ),
    (
        "permission-denied",
        include_str!("../../builtin-rules/permission-denied.toml"),
    ),
    (
        "connection-refused",
        include_str!("../../builtin-rules/connection-refused.toml"),
    ),
    (
        "uncaught-exception",
        include_str!("../../builtin-rules/uncaught-exception.toml"),
    ),
    ("timeout", include_str!("../../builtin-rules/timeout.toml")),
    ("deprecated", include_str!("../../builtin-rules/deprecated.toml")),
];

/// Parse every embedded rule
///
/// An embedded file that fails to parse is logged and skipped.
pub fn builtin_rules() -> Vec<RuleDefinition> {
    BUILTIN_RULES
        .iter()
        .filter_map(|(name, content)| match RuleDefinition::from_toml(content) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!(rule = *name, error = %e, "failed to parse built-in rule");
                None
            }
        })
        .collect()
}

/// Names of the embedded rule files
pub fn builtin_rule_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_RULES.iter().map(|(name, _)| *name)
}
