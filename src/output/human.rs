#![forbid(unsafe_code)]

//! Human-readable report output
//!
//! Groups are printed in rank order with a coloured severity tag, the shared
//! line text, the rule's solution and the context window of the first
//! occurrence. A per-severity summary closes each report.

use crate::config::ColorOption;
use crate::engine::{AnalysisReport, ContextWindow, ErrorGroup};
use crate::types::Severity;
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve the configured colour option against the actual stdout
pub fn color_choice(option: ColorOption) -> ColorChoice {
    match option {
        ColorOption::Always => ColorChoice::Always,
        ColorOption::Never => ColorChoice::Never,
        ColorOption::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
        ColorOption::Auto => ColorChoice::Never,
    }
}

fn severity_spec(severity: Severity) -> ColorSpec {
    let mut spec = ColorSpec::new();
    match severity {
        Severity::Critical => spec.set_fg(Some(Color::Red)).set_bold(true),
        Severity::Error => spec.set_fg(Some(Color::Red)),
        Severity::Warning => spec.set_fg(Some(Color::Yellow)),
        Severity::Info => spec.set_fg(Some(Color::Cyan)),
    };
    spec
}

/// Human-readable report formatter
#[derive(Debug, Clone, Copy)]
pub struct HumanFormatter {
    show_context: bool,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self { show_context: true }
    }

    /// Omit context windows
    pub fn without_context(mut self) -> Self {
        self.show_context = false;
        self
    }

    /// Write one report; `source` names the analyzed input
    pub fn write_report<W: WriteColor>(
        &self,
        out: &mut W,
        source: &str,
        report: &AnalysisReport,
    ) -> io::Result<()> {
        out.set_color(ColorSpec::new().set_bold(true))?;
        write!(out, "{}", source)?;
        out.reset()?;
        writeln!(
            out,
            ": {} lines, {} rules, {} ms",
            report.total_lines, report.rules_applied, report.elapsed_ms
        )?;

        if report.error_groups.is_empty() {
            writeln!(out, "  No known error patterns found.")?;
        }

        for group in &report.error_groups {
            self.write_group(out, group)?;
        }

        let stats = &report.stats;
        writeln!(
            out,
            "Summary: {} critical, {} error, {} warning, {} info ({} groups, {} occurrences)",
            stats.critical_count,
            stats.error_count,
            stats.warning_count,
            stats.info_count,
            stats.total_groups,
            stats.total_occurrences
        )?;
        if report.skipped_evaluations > 0 {
            writeln!(
                out,
                "  {} evaluations skipped on oversized lines",
                report.skipped_evaluations
            )?;
        }
        writeln!(out)
    }

    fn write_group<W: WriteColor>(&self, out: &mut W, group: &ErrorGroup) -> io::Result<()> {
        writeln!(out)?;
        out.set_color(&severity_spec(group.severity))?;
        write!(out, "[{}]", group.severity)?;
        out.reset()?;

        let lines = if group.first_occurrence_line == group.last_occurrence_line {
            format!("line {}", group.first_occurrence_line)
        } else {
            format!(
                "lines {}-{}",
                group.first_occurrence_line, group.last_occurrence_line
            )
        };
        writeln!(
            out,
            " {} ({}) x{}, {}",
            group.rule_name, group.rule_id, group.count, lines
        )?;
        writeln!(out, "    {}", group.message)?;

        if let Some(solution) = &group.solution {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "    Solution:")?;
            out.reset()?;
            writeln!(out, " {}", solution)?;
        }

        if self.show_context
            && let Some(first) = group.occurrences.first()
        {
            write_context(out, &first.context)?;
        }
        Ok(())
    }

    /// Write a report to stdout with the given colour choice
    pub fn write_to_stdout(
        &self,
        source: &str,
        report: &AnalysisReport,
        color: ColorChoice,
    ) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(color);
        self.write_report(&mut stdout, source, report)?;
        stdout.flush()
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a context window with a marker on the matched line
pub fn write_context<W: WriteColor>(out: &mut W, window: &ContextWindow) -> io::Result<()> {
    let width = window
        .lines()
        .map(|l| l.line_number.to_string().len())
        .max()
        .unwrap_or(1);

    for line in window.lines() {
        if line.is_match {
            out.set_color(ColorSpec::new().set_bold(true))?;
            writeln!(out, "  > {:>width$} | {}", line.line_number, line.content)?;
            out.reset()?;
        } else {
            writeln!(out, "    {:>width$} | {}", line.line_number, line.content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Analyzer, AnalyzerOptions};
    use crate::rules::{MemoryRuleSource, RuleDefinition};
    use std::sync::Arc;
    use termcolor::Buffer;

    fn report(lines: &[&str]) -> AnalysisReport {
        let source = MemoryRuleSource::with_rules(vec![
            RuleDefinition::new("Out of memory", "out of memory")
                .with_severity(Severity::Critical)
                .with_solution("Raise the memory limit"),
            RuleDefinition::new("Timeout", "timed out").with_severity(Severity::Warning),
        ]);
        Analyzer::new(Arc::new(source), AnalyzerOptions::default())
            .analyze(lines)
            .unwrap()
    }

    fn render(formatter: HumanFormatter, report: &AnalysisReport) -> String {
        let mut buffer = Buffer::no_color();
        formatter.write_report(&mut buffer, "app.log", report).unwrap();
        String::from_utf8(buffer.into_inner()).unwrap()
    }

    #[test]
    fn test_report_with_groups() {
        let report = report(&["start", "kernel: Out of memory", "request timed out", "request timed out"]);
        let text = render(HumanFormatter::new(), &report);

        assert!(text.starts_with("app.log: 4 lines, 2 rules"));
        assert!(text.contains("[CRITICAL] Out of memory (out-of-memory) x1, line 2"));
        assert!(text.contains("[WARNING] Timeout (timeout) x2, lines 3-4"));
        assert!(text.contains("Solution: Raise the memory limit"));
        assert!(text.contains("  > 2 | kernel: Out of memory"));
        assert!(text.contains("    1 | start"));
        assert!(text.contains("Summary: 1 critical, 0 error, 2 warning, 0 info (2 groups, 3 occurrences)"));

        let critical = text.find("[CRITICAL]").unwrap();
        let warning = text.find("[WARNING]").unwrap();
        assert!(critical < warning);
    }

    #[test]
    fn test_report_without_groups() {
        let text = render(HumanFormatter::new(), &report(&["all good"]));
        assert!(text.contains("No known error patterns found."));
        assert!(text.contains("Summary: 0 critical"));
    }

    #[test]
    fn test_without_context() {
        let report = report(&["start", "Out of memory"]);
        let text = render(HumanFormatter::new().without_context(), &report);
        assert!(!text.contains(" | "));
    }

    #[test]
    fn test_color_choice_mapping() {
        assert_eq!(color_choice(ColorOption::Always), ColorChoice::Always);
        assert_eq!(color_choice(ColorOption::Never), ColorChoice::Never);
    }
}
