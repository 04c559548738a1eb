//! Conformance patterns: declarative rules built from a list of banned
//! names or properties, a message, and an optional Trusted Type that makes a
//! use acceptable.

mod imported_name_engine;
mod name_engine;
mod property_engine;

use std::sync::Arc;

use swc_common::Span;

use crate::allowlist::{Allowlist, AllowlistEntry, AllowlistError};
use crate::checker::{RuleContext, RuleRegistrar, Usage};
use crate::matchers::{AbsoluteMatcher, MatcherError, PropertyMatcher};
use crate::rules::{Rule, RuleMetadata};

pub use imported_name_engine::ImportPattern;
use property_engine::Access;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// `<scope>|<dotted.name>` values matched by [`AbsoluteMatcher`].
    BannedName,
    /// `Type.prototype.member` values matched on any access.
    BannedProperty,
    /// `Type.prototype.member` values matched only as assignment targets.
    BannedPropertyWrite,
    /// `<module-path-regex>|<exported-name or *>` values matched on imports.
    BannedImportedName,
}

/// Which arguments of a banned call must carry the allowed Trusted Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustedArgument {
    Index(usize),
    All,
}

impl Default for TrustedArgument {
    fn default() -> Self {
        TrustedArgument::Index(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConfig {
    pub kind: PatternKind,
    pub values: Vec<String>,
    pub message: String,
    pub allowed_trusted_type: Option<String>,
    pub trusted_argument: TrustedArgument,
    /// Let name matchers flag unrenamed import specifiers too.
    pub match_imports: bool,
    /// Attached to every failure of the pattern.
    pub suggestion: Option<String>,
}

impl PatternConfig {
    pub fn new(kind: PatternKind, values: &[&str], message: impl Into<String>) -> Self {
        Self {
            kind,
            values: values.iter().map(|v| v.to_string()).collect(),
            message: message.into(),
            allowed_trusted_type: None,
            trusted_argument: TrustedArgument::default(),
            match_imports: false,
            suggestion: None,
        }
    }

    pub fn allowing(mut self, trusted_type: &str) -> Self {
        self.allowed_trusted_type = Some(trusted_type.to_string());
        self
    }

    pub fn trusted_argument(mut self, argument: TrustedArgument) -> Self {
        self.trusted_argument = argument;
        self
    }

    pub fn matching_imports(mut self) -> Self {
        self.match_imports = true;
        self
    }

    pub fn suggesting(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub(crate) fn report(&self, ctx: &mut RuleContext<'_>, span: Span) {
        match &self.suggestion {
            Some(suggestion) => {
                ctx.add_failure_with_suggestion(span, self.message.as_str(), suggestion.as_str())
            }
            None => ctx.add_failure(span, self.message.as_str()),
        }
    }

    /// Whether the use of a matched name or property is acceptable because
    /// the value it receives is the allowed Trusted Type.
    pub(crate) fn is_trusted_use(&self, ctx: &RuleContext<'_>, usage: &Usage<'_>) -> bool {
        let Some(trusted_type) = self.allowed_trusted_type.as_deref() else {
            return false;
        };

        match usage {
            Usage::Call(args) | Usage::New(args) => {
                let trusted = |arg: &swc_ecma_ast::ExprOrSpread| {
                    arg.spread.is_none() && ctx.is_trusted(&arg.expr, trusted_type)
                };
                match self.trusted_argument {
                    TrustedArgument::Index(index) => args.get(index).is_some_and(trusted),
                    TrustedArgument::All => !args.is_empty() && args.iter().all(trusted),
                }
            }
            Usage::Write {
                value,
                compound: false,
            } => ctx.is_trusted(value, trusted_type),
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleBuildError {
    #[error("Rule '{rule}' bans nothing: no values configured")]
    NoValues { rule: String },

    #[error("Rule '{rule}': {source}")]
    Matcher {
        rule: String,
        #[source]
        source: MatcherError,
    },

    #[error("Rule '{rule}': malformed imported-name value '{value}', expected '<module-path-regex>|<name>'")]
    ImportPattern { rule: String, value: String },

    #[error("Rule '{rule}': invalid module pattern in '{value}': {source}")]
    ModulePattern {
        rule: String,
        value: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule '{rule}': {source}")]
    Allowlist {
        rule: String,
        #[source]
        source: AllowlistError,
    },
}

#[derive(Debug)]
enum Engine {
    Name(Vec<Arc<AbsoluteMatcher>>),
    Property(Vec<Arc<PropertyMatcher>>, Access),
    ImportedName(Arc<Vec<ImportPattern>>),
}

/// A rule configured by a [`PatternConfig`].
///
/// Every value is compiled into its matcher up front, so a malformed value
/// fails here rather than during a run.
#[derive(Debug)]
pub struct PatternRule {
    metadata: RuleMetadata,
    config: Arc<PatternConfig>,
    engine: Engine,
    allowlist: Allowlist,
}

impl PatternRule {
    pub fn new(metadata: RuleMetadata, config: PatternConfig) -> Result<Self, RuleBuildError> {
        let rule = metadata.name.to_string();
        if config.values.is_empty() {
            return Err(RuleBuildError::NoValues { rule });
        }
        let matcher_error = |source| RuleBuildError::Matcher {
            rule: rule.clone(),
            source,
        };

        let engine = match config.kind {
            PatternKind::BannedName => Engine::Name(
                config
                    .values
                    .iter()
                    .map(|v| {
                        AbsoluteMatcher::with_import_matching(v, config.match_imports).map(Arc::new)
                    })
                    .collect::<Result<_, _>>()
                    .map_err(matcher_error)?,
            ),
            PatternKind::BannedProperty | PatternKind::BannedPropertyWrite => {
                let matchers = config
                    .values
                    .iter()
                    .map(|v| PropertyMatcher::from_spec(v).map(Arc::new))
                    .collect::<Result<_, _>>()
                    .map_err(matcher_error)?;
                let access = if config.kind == PatternKind::BannedPropertyWrite {
                    Access::Write
                } else {
                    Access::Any
                };
                Engine::Property(matchers, access)
            }
            PatternKind::BannedImportedName => Engine::ImportedName(Arc::new(
                config
                    .values
                    .iter()
                    .map(|v| ImportPattern::parse(&rule, v))
                    .collect::<Result<_, _>>()?,
            )),
        };

        Ok(Self {
            metadata,
            config: Arc::new(config),
            engine,
            allowlist: Allowlist::default(),
        })
    }

    /// Exempts the files named by `entries` from this rule.
    pub fn with_allowlist(mut self, entries: &[AllowlistEntry]) -> Result<Self, RuleBuildError> {
        self.allowlist = Allowlist::new(entries).map_err(|source| RuleBuildError::Allowlist {
            rule: self.metadata.name.to_string(),
            source,
        })?;
        Ok(self)
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }
}

impl Rule for PatternRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn allowlist(&self) -> Option<&Allowlist> {
        (!self.allowlist.is_empty()).then_some(&self.allowlist)
    }

    fn register(&self, registrar: &mut RuleRegistrar<'_>) {
        match &self.engine {
            Engine::Name(matchers) => name_engine::register(registrar, matchers, &self.config),
            Engine::Property(matchers, access) => {
                property_engine::register(registrar, matchers, *access, &self.config)
            }
            Engine::ImportedName(patterns) => {
                imported_name_engine::register(registrar, patterns, &self.config)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;

    use super::*;
    use crate::allowlist::Allowlist;
    use crate::checker::Checker;
    use crate::program::Program;
    use crate::rules::Severity;
    use crate::semantic::ProgramResolver;

    pub(crate) fn metadata(name: &'static str) -> RuleMetadata {
        RuleMetadata {
            id: Cow::Borrowed("T100"),
            name: Cow::Borrowed(name),
            description: Cow::Borrowed("pattern under test"),
            severity: Severity::Error,
            docs_url: None,
            examples: None,
        }
    }

    /// Runs `rule` over `/p/app.ts` and returns the source text of every
    /// failure.
    pub(crate) fn run_rule_on(rule: &dyn Rule, sources: &[(&str, &str)]) -> Vec<String> {
        let program = Arc::new(
            sources
                .iter()
                .fold(Program::builder(), |builder, (path, source)| {
                    builder.add_source(*path, *source)
                })
                .build(),
        );
        let mut checker = Checker::new(Arc::new(ProgramResolver::new(Arc::clone(&program))));
        checker.register(rule, Allowlist::default());
        let file = program.file_by_path("/p/app.ts").expect("app.ts in program");

        checker
            .execute(file, false)
            .failures
            .iter()
            .map(|f| file.source()[f.start as usize..f.end as usize].to_string())
            .collect()
    }

    /// Suggestion attached to each failure of `rule` on `/p/app.ts`.
    pub(crate) fn suggestions_of(rule: &dyn Rule, source: &str) -> Vec<Option<String>> {
        let program = Arc::new(Program::builder().add_source("/p/app.ts", source).build());
        let mut checker = Checker::new(Arc::new(ProgramResolver::new(Arc::clone(&program))));
        checker.register(rule, Allowlist::default());
        let file = program.file_by_path("/p/app.ts").expect("app.ts in program");

        checker
            .execute(file, false)
            .failures
            .into_iter()
            .map(|f| f.suggestion)
            .collect()
    }

    pub(crate) fn run_pattern(config: PatternConfig, source: &str) -> Vec<String> {
        let rule = PatternRule::new(metadata("pattern"), config).expect("valid pattern");
        run_rule_on(&rule, &[("/p/app.ts", source)])
    }

    #[test]
    fn malformed_values_fail_construction() {
        let cases = [
            PatternConfig::new(PatternKind::BannedName, &["eval"], "m"),
            PatternConfig::new(PatternKind::BannedName, &["GLOBAL|Element.prototype.innerHTML"], "m"),
            PatternConfig::new(PatternKind::BannedProperty, &["Element.innerHTML"], "m"),
            PatternConfig::new(PatternKind::BannedImportedName, &["no-separator"], "m"),
            PatternConfig::new(PatternKind::BannedImportedName, &["(unclosed|name"], "m"),
            PatternConfig::new(PatternKind::BannedName, &[], "m"),
        ];

        for config in cases {
            let values = config.values.clone();
            assert!(
                PatternRule::new(metadata("bad"), config).is_err(),
                "{values:?} should not build"
            );
        }
    }

    #[test]
    fn name_pattern_flags_every_use() {
        let failures = run_pattern(
            PatternConfig::new(PatternKind::BannedName, &["GLOBAL|eval"], "no eval"),
            "eval('1');\nconst e = eval;\nwindow.eval('2');",
        );

        assert_eq!(failures, vec!["eval", "eval", "window.eval"]);
    }

    #[test]
    fn suggestion_is_attached_to_every_failure() {
        let rule = PatternRule::new(
            metadata("no-eval"),
            PatternConfig::new(PatternKind::BannedName, &["GLOBAL|eval"], "no eval")
                .suggesting("Call the parsed function instead"),
        )
        .unwrap();

        let suggestions = suggestions_of(&rule, "eval('1');\nwindow.eval('2');");

        assert_eq!(
            suggestions,
            vec![Some("Call the parsed function instead".to_string()); 2]
        );
    }

    #[test]
    fn failures_carry_no_suggestion_by_default() {
        let rule = PatternRule::new(
            metadata("no-eval"),
            PatternConfig::new(PatternKind::BannedName, &["GLOBAL|eval"], "no eval"),
        )
        .unwrap();

        assert_eq!(suggestions_of(&rule, "eval('1');"), vec![None]);
    }

    #[test]
    fn name_pattern_accepts_trusted_argument() {
        let config = PatternConfig::new(PatternKind::BannedName, &["GLOBAL|eval"], "no eval")
            .allowing("TrustedScript");

        let failures = run_pattern(
            config,
            "declare const script: TrustedScript;\neval(script);\neval('alert(1)');",
        );

        assert_eq!(failures, vec!["eval"]);
    }

    #[test]
    fn property_pattern_covers_dot_and_bracket_forms() {
        let failures = run_pattern(
            PatternConfig::new(
                PatternKind::BannedProperty,
                &["DOMParser.prototype.parseFromString"],
                "no parser",
            ),
            "const parser = new DOMParser();\n\
             parser.parseFromString('<b>', 'text/html');\n\
             parser['parseFromString']('<b>', 'text/html');\n\
             const f = parser.parseFromString;\n\
             declare const other: { parseFromString(s: string): void };\n\
             other.parseFromString('x');",
        );

        assert_eq!(
            failures,
            vec![
                "parser.parseFromString",
                "parser['parseFromString']",
                "parser.parseFromString"
            ]
        );
    }

    #[test]
    fn property_write_pattern_ignores_reads() {
        let config = PatternConfig::new(
            PatternKind::BannedPropertyWrite,
            &["Element.prototype.innerHTML"],
            "no innerHTML",
        )
        .allowing("TrustedHTML");

        let failures = run_pattern(
            config,
            "declare const el: HTMLDivElement;\n\
             declare const html: TrustedHTML;\n\
             const current = el.innerHTML;\n\
             el.innerHTML = '<b>';\n\
             el['innerHTML'] = '<i>';\n\
             el.innerHTML = html;\n\
             el.innerHTML += html;",
        );

        assert_eq!(failures, vec!["el.innerHTML", "el['innerHTML']", "el.innerHTML"]);
    }

    #[test]
    fn trusted_argument_position_is_configurable() {
        let config = PatternConfig::new(
            PatternKind::BannedProperty,
            &["Element.prototype.insertAdjacentHTML"],
            "no insertAdjacentHTML",
        )
        .allowing("TrustedHTML")
        .trusted_argument(TrustedArgument::Index(1));

        let failures = run_pattern(
            config,
            "declare const el: Element;\n\
             declare const html: TrustedHTML;\n\
             el.insertAdjacentHTML('beforeend', html);\n\
             el.insertAdjacentHTML('beforeend', '<b>');",
        );

        assert_eq!(failures, vec!["el.insertAdjacentHTML"]);
    }

    #[test]
    fn all_arguments_must_be_trusted_when_configured() {
        let config = PatternConfig::new(PatternKind::BannedName, &["GLOBAL|importScripts"], "m")
            .allowing("TrustedScriptURL")
            .trusted_argument(TrustedArgument::All);

        let failures = run_pattern(
            config,
            "declare const a: TrustedScriptURL;\n\
             declare const b: TrustedScriptURL;\n\
             importScripts(a, b);\n\
             importScripts(a, '/x.js');\n\
             importScripts();",
        );

        assert_eq!(failures, vec!["importScripts", "importScripts"]);
    }
}
