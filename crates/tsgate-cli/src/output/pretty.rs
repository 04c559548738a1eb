//! Pretty formatter for human-readable terminal output
//!
//! Displays diagnostics with colors, source code context, and summary.

use colored::{ColoredString, Colorize};
use std::collections::HashMap;
use std::fs;
use tsgate_core::diagnostic::Diagnostic;
use tsgate_core::rules::Severity;

pub struct PrettyFormatter {
    sources: HashMap<String, String>,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn with_sources(sources: HashMap<String, String>) -> Self {
        Self { sources }
    }

    pub fn format(&self, diagnostics: &[Diagnostic]) -> String {
        let mut output = String::new();

        for diag in diagnostics {
            output.push_str(&self.format_diagnostic(diag));
            output.push('\n');
        }

        if !diagnostics.is_empty() {
            output.push_str(&self.format_summary(diagnostics));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut lines = Vec::new();

        let mut header = format!(
            "{}[{}]: {}",
            self.colorize_severity(&diag.severity),
            diag.rule_name.dimmed(),
            diag.message
        );
        if diag.exempted {
            header.push_str(&format!(" {}", "(exempted)".dimmed()));
        }
        lines.push(header);

        lines.push(format!(
            "  {} {}:{}:{}",
            "-->".blue(),
            diag.file,
            diag.line,
            diag.column
        ));

        let padding = " ".repeat(diag.line.to_string().len());

        if let Some(source_line) = self.get_source_line(&diag.file, diag.line) {
            lines.push(format!("{} {}", padding, "|".blue()));
            lines.push(format!(
                "{} {} {}",
                diag.line.to_string().blue(),
                "|".blue(),
                source_line
            ));

            let caret_padding = " ".repeat(diag.column.saturating_sub(1));
            let caret_len = if diag.end_line == diag.line && diag.end_column > diag.column {
                diag.end_column - diag.column
            } else {
                1
            };
            lines.push(format!(
                "{} {} {}{}",
                padding,
                "|".blue(),
                caret_padding,
                "^".repeat(caret_len).red()
            ));
            lines.push(format!("{} {}", padding, "|".blue()));
        }

        if let Some(suggestion) = &diag.suggestion {
            lines.push(format!(
                "{} {} {} {}",
                padding,
                "=".blue(),
                "suggestion:".green(),
                suggestion
            ));
        }

        lines.join("\n")
    }

    fn colorize_severity(&self, severity: &Severity) -> ColoredString {
        match severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
            Severity::Hint => "hint".cyan().bold(),
        }
    }

    fn get_source_line(&self, file: &str, line: usize) -> Option<String> {
        let index = line.checked_sub(1)?;
        if let Some(source) = self.sources.get(file) {
            return source.lines().nth(index).map(str::to_string);
        }

        let content = fs::read_to_string(file).ok()?;
        content.lines().nth(index).map(str::to_string)
    }

    fn format_summary(&self, diagnostics: &[Diagnostic]) -> String {
        let reported: Vec<&Diagnostic> = diagnostics.iter().filter(|d| !d.exempted).collect();
        let error_count = reported
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
            .count();
        let warning_count = reported
            .iter()
            .filter(|d| matches!(d.severity, Severity::Warning))
            .count();
        let exempted_count = diagnostics.len() - reported.len();

        let total = reported.len();
        let problems_str = if total == 1 { "problem" } else { "problems" };

        let mut summary = format!(
            "\nFound {} {} ({}, {})",
            total.to_string().bold(),
            problems_str,
            plural(error_count, "error").red(),
            plural(warning_count, "warning").yellow()
        );
        if exempted_count > 0 {
            summary.push_str(&format!(
                ", {}",
                format!("{} exempted", exempted_count).dimmed()
            ));
        }
        summary.push('\n');
        summary
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
