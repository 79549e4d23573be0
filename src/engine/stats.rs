//! Per-severity totals over a set of error groups

use crate::engine::aggregator::ErrorGroup;
use crate::types::Severity;
use serde::Serialize;

/// Summary counts for a report
///
/// Severity buckets sum occurrence counts of the groups with that severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub critical_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub total_occurrences: usize,
    pub total_groups: usize,
}

impl Stats {
    pub fn from_groups(groups: &[ErrorGroup]) -> Self {
        groups.iter().fold(Self::default(), |mut stats, group| {
            match group.severity {
                Severity::Critical => stats.critical_count += group.count,
                Severity::Error => stats.error_count += group.count,
                Severity::Warning => stats.warning_count += group.count,
                Severity::Info => stats.info_count += group.count,
            }
            stats.total_occurrences += group.count;
            stats.total_groups += 1;
            stats
        })
    }

    /// Occurrences with the given severity
    pub fn count_for(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical_count,
            Severity::Error => self.error_count,
            Severity::Warning => self.warning_count,
            Severity::Info => self.info_count,
        }
    }

    /// Occurrences at or above `threshold`
    pub fn count_at_least(&self, threshold: Severity) -> usize {
        Severity::all()
            .into_iter()
            .filter(|s| s.is_at_least(threshold))
            .map(|s| self.count_for(s))
            .sum()
    }
}
