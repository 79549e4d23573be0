//! Output formatters (human, JSON and JSONL)

pub mod human;
pub mod json;
pub mod jsonl;
pub mod rule_list;

pub use human::{HumanFormatter, color_choice};
pub use json::JsonFormatter;
pub use jsonl::JsonlFormatter;
pub use rule_list::{RuleEntry, RuleListHumanFormatter, RuleListJsonlFormatter, RuleState, rule_entries};
