//! Context handed to rule handlers while the checker walks one file.

use swc_common::Span;
use swc_ecma_ast::Expr;
use tracing::trace;

use super::RuleScope;
use crate::failure::Failure;
use crate::program::SourceFile;
use crate::rules::Confidence;
use crate::rules::trusted_types::TrustedTypes;
use crate::semantic::TypeResolver;

/// Failures collected during one `execute` call.
#[derive(Debug, Default)]
pub(crate) struct FailureSink {
    pub failures: Vec<Failure>,
    pub exempted: Vec<Failure>,
    pub report_exempted: bool,
}

impl FailureSink {
    pub fn new(report_exempted: bool) -> Self {
        Self {
            report_exempted,
            ..Default::default()
        }
    }
}

pub struct RuleContext<'c> {
    resolver: &'c dyn TypeResolver,
    file: &'c SourceFile,
    scope: &'c RuleScope,
    trusted_types: &'c TrustedTypes,
    sink: &'c mut FailureSink,
}

impl<'c> RuleContext<'c> {
    pub(crate) fn new(
        resolver: &'c dyn TypeResolver,
        file: &'c SourceFile,
        scope: &'c RuleScope,
        trusted_types: &'c TrustedTypes,
        sink: &'c mut FailureSink,
    ) -> Self {
        Self {
            resolver,
            file,
            scope,
            trusted_types,
            sink,
        }
    }

    pub fn resolver(&self) -> &'c dyn TypeResolver {
        self.resolver
    }

    pub fn file(&self) -> &'c SourceFile {
        self.file
    }

    pub fn rule_name(&self) -> &str {
        &self.scope.name
    }

    pub fn trusted_types(&self) -> &'c TrustedTypes {
        self.trusted_types
    }

    /// Whether `expr` is provably a value of the Trusted Type `type_name`.
    pub fn is_trusted(&self, expr: &Expr, type_name: &str) -> bool {
        self.trusted_types.proves(self.resolver, expr, type_name)
    }

    pub fn add_failure(&mut self, span: Span, message: impl Into<String>) {
        let failure = self.failure(span, message);
        self.report(failure);
    }

    pub fn add_failure_with_confidence(
        &mut self,
        span: Span,
        message: impl Into<String>,
        confidence: Confidence,
    ) {
        let failure = self.failure(span, message).with_confidence(confidence);
        self.report(failure);
    }

    pub fn add_failure_with_suggestion(
        &mut self,
        span: Span,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        let failure = self.failure(span, message).with_suggestion(suggestion);
        self.report(failure);
    }

    /// A high-confidence failure of the current rule at `span`, to be refined
    /// and passed to [`report`](Self::report).
    pub fn failure(&self, span: Span, message: impl Into<String>) -> Failure {
        Failure {
            start: self.file.offset_of(span.lo),
            end: self.file.offset_of(span.hi),
            message: message.into(),
            rule_name: self.scope.name.clone(),
            file: self.file.path().to_string(),
            confidence: Confidence::High,
            suggestion: None,
        }
    }

    /// Records a failure, or an exempted failure when the file is on the
    /// rule's allowlist. Exempted failures are dropped unless requested.
    pub fn report(&mut self, failure: Failure) {
        if self.scope.allowlist.is_allowlisted(self.file.path()) {
            trace!(rule = %failure.rule_name, file = %failure.file, "exempted failure");
            if self.sink.report_exempted {
                self.sink.exempted.push(failure);
            }
            return;
        }
        self.sink.failures.push(failure);
    }
}
