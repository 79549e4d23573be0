//! Ordering of error groups by importance

use crate::engine::aggregator::ErrorGroup;
use std::cmp::Ordering;

/// Importance order of two groups
///
/// Severity rank ascending (critical first), then weight descending, then
/// occurrence count descending. Rule id and message break the remaining ties,
/// which makes this a total order over distinct groups.
pub fn compare_groups(a: &ErrorGroup, b: &ErrorGroup) -> Ordering {
    a.severity
        .rank()
        .cmp(&b.severity.rank())
        .then_with(|| b.weight.cmp(&a.weight))
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.rule_id.cmp(&b.rule_id))
        .then_with(|| a.message.cmp(&b.message))
}

/// Sort groups into importance order
pub fn rank_groups(groups: &mut [ErrorGroup]) {
    groups.sort_by(compare_groups);
}
