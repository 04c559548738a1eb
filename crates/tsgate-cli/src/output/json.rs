//! JSON output formatter for programmatic integration

use serde::Serialize;
use std::collections::HashSet;
use tsgate_core::diagnostic::Diagnostic;
use tsgate_core::rules::{Confidence, Severity};

#[derive(Serialize)]
pub struct JsonOutput {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub tsgate_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_diagnostics: usize,
    pub exempted: usize,
    pub by_severity: SeverityCounts,
}

#[derive(Serialize, Default)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub hint: usize,
}

#[derive(Serialize)]
pub struct JsonDiagnostic {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub message: String,
    pub location: JsonLocation,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Serialize)]
pub struct JsonLocation {
    pub file: String,
    pub start: JsonPosition,
    pub end: JsonPosition,
}

#[derive(Serialize)]
pub struct JsonPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(
        &self,
        diagnostics: &[Diagnostic],
        total_files: usize,
        analyzed_path: &str,
    ) -> String {
        let output = JsonOutput {
            version: "1.0",
            metadata: self.build_metadata(analyzed_path),
            summary: self.build_summary(diagnostics, total_files),
            diagnostics: diagnostics.iter().map(convert_diagnostic).collect(),
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_metadata(&self, analyzed_path: &str) -> JsonMetadata {
        JsonMetadata {
            tsgate_version: env!("CARGO_PKG_VERSION"),
            working_directory: std::env::current_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            analyzed_path: analyzed_path.to_string(),
        }
    }

    fn build_summary(&self, diagnostics: &[Diagnostic], total_files: usize) -> JsonSummary {
        let mut by_severity = SeverityCounts::default();
        let mut files_with_issues: HashSet<&str> = HashSet::new();
        let mut exempted = 0;

        for diag in diagnostics {
            if diag.exempted {
                exempted += 1;
                continue;
            }
            match diag.severity {
                Severity::Error => by_severity.error += 1,
                Severity::Warning => by_severity.warning += 1,
                Severity::Info => by_severity.info += 1,
                Severity::Hint => by_severity.hint += 1,
            }
            files_with_issues.insert(&diag.file);
        }

        JsonSummary {
            total_files,
            files_with_issues: files_with_issues.len(),
            total_diagnostics: diagnostics.len() - exempted,
            exempted,
            by_severity,
        }
    }
}

fn convert_diagnostic(diag: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        rule_id: diag.rule_id.clone(),
        rule_name: diag.rule_name.clone(),
        severity: diag.severity,
        confidence: diag.confidence,
        message: diag.message.clone(),
        location: JsonLocation {
            file: diag.file.clone(),
            start: JsonPosition {
                line: diag.line,
                column: diag.column,
            },
            end: JsonPosition {
                line: diag.end_line,
                column: diag.end_column,
            },
        },
        exempted: diag.exempted,
        suggestion: diag.suggestion.clone(),
    }
}
