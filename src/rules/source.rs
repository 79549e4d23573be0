#![forbid(unsafe_code)]

//! Rule sources
//!
//! A [`RuleSource`] hands the rule cache the current set of rule records.
//! Implementations:
//! - [`MemoryRuleSource`]: a mutable in-process store
//! - [`FileRuleSource`]: a JSON seed file or a directory of rule files
//! - [`BuiltinRuleSource`]: rules embedded in the binary
//! - [`LayeredRuleSource`]: several sources, later ones overriding earlier ones

use crate::error::RuleSourceError;
use crate::rules::builtin;
use crate::rules::rule::RuleDefinition;
use crate::types::RuleId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplier of rule records
///
/// The trait is `Send + Sync` so one source can back a cache shared by
/// concurrent analyses.
pub trait RuleSource: Send + Sync {
    /// Fetch every rule record the source currently holds
    ///
    /// # Errors
    ///
    /// Returns `RuleSourceError` when the backing store cannot be read. An
    /// empty store is `Ok(vec![])`, never an error.
    fn load_rules(&self) -> Result<Vec<RuleDefinition>, RuleSourceError>;
}

/// Thread-safe in-memory rule store
///
/// Every mutation bumps the affected record's version. Versions never go
/// backwards for an id, even across a remove and re-insert. Callers holding
/// a rule cache backed by this store must invalidate it after mutating.
#[derive(Debug, Default)]
pub struct MemoryRuleSource {
    store: RwLock<MemoryStore>,
}

#[derive(Debug, Default)]
struct MemoryStore {
    rules: Vec<RuleDefinition>,
    /// Last version of each removed record
    retired: HashMap<RuleId, u64>,
}

impl MemoryStore {
    fn position(&self, id: &RuleId) -> Option<usize> {
        self.rules
            .iter()
            .position(|r| r.resolved_id().as_ref() == Some(id))
    }
}

impl MemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<RuleDefinition>) -> Self {
        Self {
            store: RwLock::new(MemoryStore {
                rules,
                retired: HashMap::new(),
            }),
        }
    }

    /// Insert a record or replace the one with the same id
    ///
    /// Returns the stored version. A record re-inserted after removal
    /// continues from its last version.
    pub fn upsert(&self, mut rule: RuleDefinition) -> u64 {
        let id = rule.resolved_id();
        let mut store = self.store.write();
        let existing = id.as_ref().and_then(|id| store.position(id));

        match existing {
            Some(index) => {
                rule.version = store.rules[index].version.max(rule.version) + 1;
                let version = rule.version;
                store.rules[index] = rule;
                version
            }
            None => {
                if let Some(retired) = id.as_ref().and_then(|id| store.retired.remove(id)) {
                    rule.version = retired.max(rule.version) + 1;
                }
                let version = rule.version;
                store.rules.push(rule);
                version
            }
        }
    }

    /// Remove the record with the given id
    ///
    /// Returns false if no such record exists.
    pub fn remove(&self, id: &RuleId) -> bool {
        let mut store = self.store.write();
        match store.position(id) {
            Some(index) => {
                let removed = store.rules.remove(index);
                store.retired.insert(id.clone(), removed.version);
                true
            }
            None => false,
        }
    }

    /// Enable or disable a record
    ///
    /// Returns false if no such record exists.
    pub fn set_enabled(&self, id: &RuleId, enabled: bool) -> bool {
        let mut store = self.store.write();
        match store
            .rules
            .iter_mut()
            .find(|r| r.resolved_id().as_ref() == Some(id))
        {
            Some(rule) => {
                if rule.enabled != enabled {
                    rule.enabled = enabled;
                    rule.version += 1;
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &RuleId) -> Option<RuleDefinition> {
        let store = self.store.read();
        store.position(id).map(|index| store.rules[index].clone())
    }

    pub fn len(&self) -> usize {
        self.store.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().rules.is_empty()
    }
}

impl RuleSource for MemoryRuleSource {
    fn load_rules(&self) -> Result<Vec<RuleDefinition>, RuleSourceError> {
        Ok(self.store.read().rules.clone())
    }
}

/// Rules read from the file system on every load
///
/// The path may be:
/// - a `.json` file holding an array of rule records
/// - a `.toml` rule file
/// - a directory of `.json` and `.toml` files, read in file-name order
///
/// A record that does not deserialize is logged and skipped so one bad entry
/// cannot hide the rest. A path that cannot be read is an error.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_dir(&self, dir: &Path) -> Result<Vec<RuleDefinition>, RuleSourceError> {
        let entries = fs::read_dir(dir).map_err(|source| RuleSourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RuleSourceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_rule_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut rules = Vec::new();
        for path in paths {
            rules.extend(load_file(&path)?);
        }
        Ok(rules)
    }
}

impl RuleSource for FileRuleSource {
    fn load_rules(&self) -> Result<Vec<RuleDefinition>, RuleSourceError> {
        if self.path.is_dir() {
            self.load_dir(&self.path)
        } else {
            load_file(&self.path)
        }
    }
}

fn is_rule_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("toml") | Some("json")
    )
}

fn load_file(path: &Path) -> Result<Vec<RuleDefinition>, RuleSourceError> {
    let content = fs::read_to_string(path).map_err(|source| RuleSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => parse_json_rules(&content, path),
        _ => match RuleDefinition::from_toml(&content) {
            Ok(rule) => Ok(vec![rule]),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable rule file");
                Ok(Vec::new())
            }
        },
    }
}

/// Parse a JSON array of rule records, skipping malformed elements
pub(crate) fn parse_json_rules(
    content: &str,
    path: &Path,
) -> Result<Vec<RuleDefinition>, RuleSourceError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(content).map_err(|e| RuleSourceError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut rules = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RuleDefinition>(value) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    index,
                    error = %e,
                    "skipping malformed rule record"
                );
            }
        }
    }
    Ok(rules)
}

/// Rules compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRuleSource;

impl RuleSource for BuiltinRuleSource {
    fn load_rules(&self) -> Result<Vec<RuleDefinition>, RuleSourceError> {
        Ok(builtin::builtin_rules())
    }
}

/// Several sources merged in order
///
/// A record from a later layer replaces an earlier record with the same id,
/// keeping the earlier record's position. Records without a usable id are
/// passed through for the compiler to reject.
#[derive(Default)]
pub struct LayeredRuleSource {
    layers: Vec<Box<dyn RuleSource>>,
}

impl LayeredRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl RuleSource + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn push(&mut self, layer: Box<dyn RuleSource>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl RuleSource for LayeredRuleSource {
    fn load_rules(&self) -> Result<Vec<RuleDefinition>, RuleSourceError> {
        let mut merged: Vec<RuleDefinition> = Vec::new();
        let mut positions: HashMap<RuleId, usize> = HashMap::new();

        for layer in &self.layers {
            for rule in layer.load_rules()? {
                match rule.resolved_id() {
                    Some(id) => match positions.get(&id) {
                        Some(&index) => merged[index] = rule,
                        None => {
                            positions.insert(id, merged.len());
                            merged.push(rule);
                        }
                    },
                    None => merged.push(rule),
                }
            }
        }

        Ok(merged)
    }
}

impl std::fmt::Debug for LayeredRuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredRuleSource")
            .field("layers", &self.layers.len())
            .finish()
    }
}
