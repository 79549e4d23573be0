#![forbid(unsafe_code)]

//! Raw rule records and their validation
//!
//! A [`RuleDefinition`] is the loosely-typed record handed over by a rule
//! source (JSON seed files, TOML rule files, an in-memory store). Nothing in
//! the scan loop sees it directly: [`RuleDefinition::validate`] turns it into
//! a [`ValidatedRule`] or rejects it with a [`RuleError`].

use crate::error::RuleError;
use crate::types::{RuleId, Severity};
use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_KEYWORDS: usize = 50;
pub const MAX_SOLUTION_LEN: usize = 5000;
pub const MAX_CATEGORIES: usize = 10;
pub const MAX_WEIGHT: i64 = 100;
pub const DEFAULT_WEIGHT: i64 = 50;

/// A rule record as stored by the rule-management side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Stable identifier; derived from `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Regular expression source
    #[serde(alias = "regex")]
    pub pattern: String,

    /// Literal pre-filter keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Severity name, validated case-insensitively
    #[serde(default = "default_severity")]
    pub severity: String,

    #[serde(default = "default_weight")]
    pub weight: i64,

    /// Remediation hint shown with every group this rule produces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Bumped by the owning store on every mutation
    #[serde(default = "default_version")]
    pub version: u64,
}

fn default_severity() -> String {
    Severity::Error.as_str().to_string()
}

fn default_weight() -> i64 {
    DEFAULT_WEIGHT
}

fn default_enabled() -> bool {
    true
}

fn default_version() -> u64 {
    1
}

/// TOML layout of a single rule file
///
/// ```toml
/// [rule]
/// id = "disk-full"
/// name = "Disk full"
/// severity = "error"
/// weight = 80
///
/// [match]
/// pattern = "no space left on device"
/// keywords = ["space"]
/// ```
#[derive(Debug, Deserialize)]
struct RuleFile {
    rule: RuleSection,
    #[serde(rename = "match")]
    match_section: MatchSection,
}

#[derive(Debug, Deserialize)]
struct RuleSection {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default = "default_severity")]
    severity: String,
    #[serde(default = "default_weight")]
    weight: i64,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default = "default_version")]
    version: u64,
}

#[derive(Debug, Deserialize)]
struct MatchSection {
    pattern: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl RuleDefinition {
    /// Creates an enabled ERROR rule with default weight and no keywords
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            pattern: pattern.into(),
            keywords: Vec::new(),
            severity: default_severity(),
            weight: DEFAULT_WEIGHT,
            solution: None,
            categories: Vec::new(),
            enabled: true,
            version: 1,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity.as_str().to_string();
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Parse a rule from the TOML rule-file layout
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidDefinition` if the TOML is malformed or
    /// required fields are missing. Field values are not validated here.
    pub fn from_toml(content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(content)
            .map_err(|e| RuleError::InvalidDefinition(format!("Failed to parse TOML: {}", e)))?;

        Ok(Self {
            id: file.rule.id,
            name: file.rule.name,
            pattern: file.match_section.pattern,
            keywords: file.match_section.keywords,
            severity: file.rule.severity,
            weight: file.rule.weight,
            solution: file.rule.solution,
            categories: file.rule.categories,
            enabled: file.rule.enabled,
            version: file.rule.version,
        })
    }

    /// The identity this record is stored under
    ///
    /// Uses the explicit id when present, otherwise a slug of the name.
    pub fn resolved_id(&self) -> Option<RuleId> {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => RuleId::new(id),
            _ => RuleId::from_name(&self.name),
        }
    }

    /// Validate the record and normalize it for compilation
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidDefinition` describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<ValidatedRule, RuleError> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(RuleError::InvalidDefinition(format!(
                "rule name must be 1 to {} characters, got '{}'",
                MAX_NAME_LEN, self.name
            )));
        }

        let id = self.resolved_id().ok_or_else(|| {
            RuleError::InvalidDefinition(format!(
                "rule '{}' has no usable id: {:?}",
                name, self.id
            ))
        })?;

        if self.pattern.trim().is_empty() {
            return Err(RuleError::InvalidDefinition(format!(
                "rule '{}' has an empty pattern",
                id
            )));
        }

        if self.keywords.len() > MAX_KEYWORDS {
            return Err(RuleError::InvalidDefinition(format!(
                "rule '{}' has {} keywords, at most {} allowed",
                id,
                self.keywords.len(),
                MAX_KEYWORDS
            )));
        }

        let severity: Severity = self
            .severity
            .parse()
            .map_err(|e| RuleError::InvalidDefinition(format!("rule '{}': {}", id, e)))?;

        if !(0..=MAX_WEIGHT).contains(&self.weight) {
            return Err(RuleError::InvalidDefinition(format!(
                "rule '{}' weight {} is outside 0..={}",
                id, self.weight, MAX_WEIGHT
            )));
        }

        if let Some(solution) = &self.solution
            && solution.chars().count() > MAX_SOLUTION_LEN
        {
            return Err(RuleError::InvalidDefinition(format!(
                "rule '{}' solution exceeds {} characters",
                id, MAX_SOLUTION_LEN
            )));
        }

        if self.categories.len() > MAX_CATEGORIES {
            return Err(RuleError::InvalidDefinition(format!(
                "rule '{}' has {} categories, at most {} allowed",
                id,
                self.categories.len(),
                MAX_CATEGORIES
            )));
        }

        Ok(ValidatedRule {
            id,
            name: name.to_string(),
            pattern: self.pattern.clone(),
            keywords: normalize_keywords(&self.keywords),
            severity,
            weight: self.weight as u8,
            solution: self
                .solution
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

/// A rule record that passed validation, ready for pattern compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRule {
    pub id: RuleId,
    pub name: String,
    pub pattern: String,
    /// Lower-cased, trimmed, de-duplicated, in first-seen order
    pub keywords: Vec<String>,
    pub severity: Severity,
    pub weight: u8,
    pub solution: Option<String>,
}

fn normalize_keywords(raw: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::with_capacity(raw.len());
    for keyword in raw {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords
}
