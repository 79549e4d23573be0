#![forbid(unsafe_code)]

//! Rule records, compilation, sources and the compiled-rule cache

pub mod builtin;
mod cache;
mod compiled;
mod rule;
mod source;

// Re-export core types
pub use cache::{DEFAULT_RULE_CACHE_TTL, RuleCache, RuleSet};
pub use compiled::{
    CompileOutput, CompiledRule, DEFAULT_REGEX_SIZE_LIMIT, MatchOutcome, RuleCompiler,
    RuleRejection, SkipReason,
};
pub use rule::{RuleDefinition, ValidatedRule};
pub use source::{
    BuiltinRuleSource, FileRuleSource, LayeredRuleSource, MemoryRuleSource, RuleSource,
};
