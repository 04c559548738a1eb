//! Diagnostic reporting for analysis results
//!
//! A [`Diagnostic`] is a failure as the user sees it: positioned by line and
//! column, labelled with the rule's stable id and its configured severity.

use serde::Serialize;

use crate::failure::Failure;
use crate::program::SourceFile;
use crate::rules::{Confidence, RuleMetadata, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Reported only because exempted failures were requested.
    pub exempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        let rule_id = rule_id.into();
        Self {
            rule_name: rule_id.clone(),
            rule_id,
            severity,
            confidence: Confidence::High,
            message: message.into(),
            file: file.into(),
            line,
            column,
            end_line: line,
            end_column: column,
            exempted: false,
            suggestion: None,
        }
    }

    /// Translates a rule failure, positioned within `file`.
    pub fn from_failure(
        failure: &Failure,
        file: &SourceFile,
        metadata: &RuleMetadata,
        severity: Severity,
    ) -> Self {
        let ((line, column), (end_line, end_column)) = failure.position(file);
        Self {
            rule_id: metadata.id.to_string(),
            rule_name: metadata.name.to_string(),
            severity,
            confidence: failure.confidence,
            message: failure.message.clone(),
            file: failure.file.clone(),
            line,
            column,
            end_line,
            end_column,
            exempted: false,
            suggestion: failure.suggestion.clone(),
        }
    }

    pub fn with_name(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = rule_name.into();
        self
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn exempted(mut self) -> Self {
        self.exempted = true;
        self
    }
}
