//! Failures reported by rules during a checker run.

use crate::program::SourceFile;
use crate::rules::Confidence;

/// A rule violation at a span of one source file.
///
/// `start` and `end` are byte offsets into the file's source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Failure {
    pub start: u32,
    pub end: u32,
    pub message: String,
    pub rule_name: String,
    pub file: String,
    pub confidence: Confidence,
    /// How to rewrite the flagged code, when the rule knows a remedy.
    pub suggestion: Option<String>,
}

impl Failure {
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// One-based `(line, column)` of the start and end of the failure.
    pub fn position(&self, file: &SourceFile) -> ((usize, usize), (usize, usize)) {
        (file.line_col(self.start), file.line_col(self.end))
    }

    pub fn meets(&self, min_confidence: Confidence) -> bool {
        self.confidence.level() >= min_confidence.level()
    }
}

/// Failures of one checker run, split by exemption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    pub failures: Vec<Failure>,
    /// Failures suppressed by an allowlist. Empty unless requested.
    pub exempted_failures: Vec<Failure>,
}

impl CheckResult {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.exempted_failures.is_empty()
    }
}
