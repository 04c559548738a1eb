//! Analysis engine for Trusted Types conformance checks
//!
//! Combines the rule registry, the tool configuration and the project's
//! exemption list, and turns checker failures into diagnostics. Checkers are
//! bound to one program's type resolver; [`CheckerCache`] keeps one per
//! program for callers that analyze many files of the same program.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::checker::Checker;
use crate::config::exemptions::{
    ExemptionError, ExemptionList, ParsedExemptions, load_exemption_config,
};
use crate::config::Config;
use crate::config::tsconfig::exemption_config_path;
use crate::diagnostic::Diagnostic;
use crate::program::{Program, ProgramId, SourceFile};
use crate::rules::builtin::builtin_registry;
use crate::rules::custom::custom_rules;
use crate::rules::pattern::RuleBuildError;
use crate::rules::trusted_types::TrustedTypes;
use crate::rules::{RuleRegistry, Severity};
use crate::semantic::{ProgramResolver, TypeResolver};

/// Rule id of diagnostics for syntax errors.
pub const PARSE_RULE_ID: &str = "PARSE";
/// Rule id of diagnostics for problems in the exemption file.
pub const EXEMPTION_RULE_ID: &str = "EXEMPTION";

pub struct AnalysisEngine {
    registry: RuleRegistry,
    trusted_types: TrustedTypes,
    exemptions: ExemptionList,
    exemption_diagnostics: Vec<Diagnostic>,
    rule_errors: Vec<RuleBuildError>,
    audit: bool,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            registry: builtin_registry(),
            trusted_types: TrustedTypes::default(),
            exemptions: ExemptionList::default(),
            exemption_diagnostics: Vec::new(),
            rule_errors: Vec::new(),
            audit: false,
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let mut registry = builtin_registry();
        let (rules, rule_errors) = custom_rules(&config.custom_rules);
        for error in &rule_errors {
            warn!("Skipping custom rule: {}", error);
        }
        for rule in rules {
            registry.register(rule);
        }
        registry.configure(&config.rules);

        Self {
            registry,
            trusted_types: TrustedTypes::from(&config.trusted_types),
            exemptions: ExemptionList::default(),
            exemption_diagnostics: Vec::new(),
            rule_errors,
            audit: false,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// Custom rules that failed to build and were skipped.
    pub fn rule_errors(&self) -> &[RuleBuildError] {
        &self.rule_errors
    }

    pub fn exemptions(&self) -> &ExemptionList {
        &self.exemptions
    }

    /// Warnings about the exemption file: malformed entries and rule names
    /// that no rule owns.
    pub fn exemption_diagnostics(&self) -> &[Diagnostic] {
        &self.exemption_diagnostics
    }

    /// Reports exempted failures too, marked as exempted.
    pub fn set_audit(&mut self, audit: bool) {
        self.audit = audit;
    }

    pub fn load_exemptions(&mut self, path: &Path) -> Result<(), ExemptionError> {
        let parsed = load_exemption_config(path)?;
        self.set_exemptions(parsed, &path.to_string_lossy());
        Ok(())
    }

    /// Installs a parsed exemption list read from `path`. Checkers built
    /// before this call keep the exemptions they were built with.
    pub fn set_exemptions(&mut self, parsed: ParsedExemptions, path: &str) {
        let ParsedExemptions { list, diagnostics } = parsed;
        let unknown = list.unknown_rules(|name| self.registry.get_rule_by_name(name).is_some());

        self.exemption_diagnostics = diagnostics
            .into_iter()
            .chain(unknown)
            .map(|d| {
                warn!(file = %path, line = d.line, "{}", d.message);
                Diagnostic::new(EXEMPTION_RULE_ID, Severity::Warning, d.message, path, d.line, d.column)
            })
            .collect();
        debug!(file = %path, rules = list.entries().len(), "exemption list loaded");
        self.exemptions = list;
    }

    /// Registers every enabled rule with a new checker over `resolver`.
    pub fn build_checker(&self, resolver: Arc<dyn TypeResolver>) -> Checker {
        let mut checker = Checker::new(resolver).with_trusted_types(self.trusted_types.clone());
        for rule in self.registry.enabled_rules() {
            let mut allowlist = rule.allowlist().cloned().unwrap_or_default();
            if let Some(exempted) = self.exemptions.allowlist_for(&rule.metadata().name) {
                allowlist.merge(exempted);
            }
            checker.register(rule, allowlist);
        }
        checker
    }

    /// Diagnostics for one file: its syntax errors, then the failures of
    /// every rule at or above the minimum confidence.
    pub fn check_file(&self, checker: &Checker, file: &SourceFile) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = file
            .errors()
            .iter()
            .map(|error| {
                Diagnostic::new(
                    PARSE_RULE_ID,
                    Severity::Error,
                    &error.message,
                    file.path(),
                    error.line,
                    error.column,
                )
            })
            .collect();

        let result = checker.execute(file, self.audit);
        let min_confidence = self.registry.min_confidence();
        let failures = result
            .failures
            .iter()
            .map(|failure| (failure, false))
            .chain(result.exempted_failures.iter().map(|failure| (failure, true)));

        for (failure, exempted) in failures {
            if !failure.meets(min_confidence) {
                trace!(rule = %failure.rule_name, "below minimum confidence");
                continue;
            }
            let Some(rule) = self.registry.get_rule_by_name(&failure.rule_name) else {
                continue;
            };
            let diagnostic = Diagnostic::from_failure(
                failure,
                file,
                rule.metadata(),
                self.registry.severity_for(rule),
            );
            diagnostics.push(if exempted { diagnostic.exempted() } else { diagnostic });
        }

        diagnostics
    }

    /// Checks every source file of `program` that is not a declaration file.
    pub fn analyze(&self, program: &Arc<Program>) -> Vec<Diagnostic> {
        let checker = self.build_checker(Arc::new(ProgramResolver::new(Arc::clone(program))));
        program
            .user_files()
            .filter(|file| !file.is_declaration())
            .flat_map(|file| self.check_file(&checker, file))
            .collect()
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkers by program. A checker is only valid for the program whose
/// resolver it was built over, so a rebuilt program needs
/// [`CheckerCache::invalidate`] or simply gets a new entry under its new id.
#[derive(Debug, Default)]
pub struct CheckerCache {
    checkers: HashMap<ProgramId, Arc<Checker>>,
}

impl CheckerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, engine: &AnalysisEngine, program: &Arc<Program>) -> Arc<Checker> {
        if let Some(checker) = self.checkers.get(&program.id()) {
            trace!(program = program.id().value(), "checker cache hit");
            return Arc::clone(checker);
        }

        let resolver = Arc::new(ProgramResolver::new(Arc::clone(program)));
        let checker = Arc::new(engine.build_checker(resolver));
        debug!(
            program = program.id().value(),
            rules = checker.rule_names().len(),
            "checker built"
        );
        self.checkers.insert(program.id(), Arc::clone(&checker));
        checker
    }

    /// Drops the checker of `program`. Returns whether one was cached.
    pub fn invalidate(&mut self, program: ProgramId) -> bool {
        self.checkers.remove(&program).is_some()
    }

    pub fn clear(&mut self) {
        self.checkers.clear();
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

/// Locates the exemption list: `[exemptions].config` relative to
/// `config_dir`, else the plugin option of `tsconfig`.
pub fn find_exemption_config(
    config: &Config,
    config_dir: &Path,
    tsconfig: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = &config.exemptions.config {
        return Some(config_dir.join(path));
    }

    let tsconfig = tsconfig?;
    match exemption_config_path(tsconfig) {
        Ok(path) => path,
        Err(e) => {
            warn!("Cannot read exemption config location: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::exemptions::parse_exemption_config;
    use crate::config::{ConfidenceValue, CustomRuleConfig, PatternKindValue, SeverityValue};
    use crate::rules::Confidence;

    fn program(sources: &[(&str, &str)]) -> Arc<Program> {
        Arc::new(
            sources
                .iter()
                .fold(Program::builder(), |builder, (path, source)| {
                    builder.add_source(*path, *source)
                })
                .build(),
        )
    }

    fn rule_ids(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.rule_id.as_str()).collect()
    }

    #[test]
    fn analyze_reports_builtin_rules() {
        let engine = AnalysisEngine::new();
        let program = program(&[("/p/app.ts", "eval('1');\ndocument.write('<b>');")]);

        let diagnostics = engine.analyze(&program);

        assert_eq!(rule_ids(&diagnostics), vec!["TT001", "TT003"]);
        assert_eq!(diagnostics[0].rule_name, "ban-eval-calls");
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 1));
        assert_eq!(diagnostics[1].line, 2);
    }

    #[test]
    fn diagnostics_carry_rule_suggestions() {
        let engine = AnalysisEngine::new();
        let program = program(&[(
            "/p/app.ts",
            "declare const s: string;\ndocument.querySelectorAll('p')[0].innerHTML = s;",
        )]);

        let diagnostics = engine.analyze(&program);

        assert_eq!(rule_ids(&diagnostics), vec!["TT006"]);
        assert_eq!(
            diagnostics[0].suggestion.as_deref(),
            Some("Create the value with a Trusted Types policy: policy.createHTML(value)")
        );
    }

    #[test]
    fn syntax_errors_become_diagnostics() {
        let engine = AnalysisEngine::new();
        let program = program(&[("/p/app.ts", "const = ;")]);

        let diagnostics = engine.analyze(&program);

        assert!(
            diagnostics.iter().any(|d| d.rule_id == PARSE_RULE_ID),
            "Expected PARSE diagnostic for syntax error"
        );
    }

    #[test]
    fn configuration_disables_and_overrides_rules() {
        let mut config = Config::default();
        config.rules.disabled = vec!["TT003".to_string()];
        config
            .rules
            .severity
            .insert("ban-eval-calls".to_string(), SeverityValue::Warning);
        let engine = AnalysisEngine::with_config(&config);
        let program = program(&[("/p/app.ts", "eval('1');\ndocument.write('<b>');")]);

        let diagnostics = engine.analyze(&program);

        assert_eq!(rule_ids(&diagnostics), vec!["TT001"]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn min_confidence_filters_loose_findings() {
        let source = "declare const el: Element;\n\
                      declare const name: string;\n\
                      el.setAttribute('onclick', 'x');\n\
                      el.setAttribute(name, 'x');";
        let program = program(&[("/p/app.ts", source)]);

        let all = AnalysisEngine::new().analyze(&program);
        let mut config = Config::default();
        config.rules.min_confidence = Some(ConfidenceValue::Medium);
        let confident = AnalysisEngine::with_config(&config).analyze(&program);

        assert_eq!(all.len(), 2);
        assert_eq!(all[1].confidence, Confidence::Low);
        assert_eq!(confident.len(), 1);
        assert_eq!(confident[0].confidence, Confidence::High);
    }

    #[test]
    fn custom_rules_join_the_registry() {
        let mut config = Config::default();
        config.custom_rules = vec![
            CustomRuleConfig {
                name: "ban-alert".to_string(),
                kind: PatternKindValue::BannedName,
                values: vec!["GLOBAL|alert".to_string()],
                message: "alert blocks the page".to_string(),
                allowed_trusted_type: None,
                suggestion: None,
                allowlist: Vec::new(),
            },
            CustomRuleConfig {
                name: "broken".to_string(),
                kind: PatternKindValue::BannedName,
                values: vec!["alert".to_string()],
                message: "x".to_string(),
                allowed_trusted_type: None,
                suggestion: None,
                allowlist: Vec::new(),
            },
        ];
        let engine = AnalysisEngine::with_config(&config);
        let program = program(&[("/p/app.ts", "alert('hi');")]);

        let diagnostics = engine.analyze(&program);

        assert_eq!(engine.rule_errors().len(), 1);
        assert_eq!(engine.registry().len(), 26);
        assert_eq!(rule_ids(&diagnostics), vec!["TC001"]);
        assert_eq!(diagnostics[0].message, "alert blocks the page");
    }

    #[test]
    fn exemptions_are_hidden_unless_auditing() {
        let mut engine = AnalysisEngine::new();
        engine.set_exemptions(
            parse_exemption_config(
                "/p/exemptions.json",
                r#"{ "ban-eval-calls": ["src/legacy/*.ts"] }"#.to_string(),
            ),
            "/p/exemptions.json",
        );
        let program = program(&[
            ("/p/src/legacy/old.ts", "eval('1');"),
            ("/p/src/app.ts", "eval('2');"),
        ]);

        let reported = engine.analyze(&program);
        engine.set_audit(true);
        let audited = engine.analyze(&program);

        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].file, "/p/src/app.ts");
        assert_eq!(audited.len(), 2);
        assert!(audited.iter().any(|d| d.exempted && d.file == "/p/src/legacy/old.ts"));
    }

    #[test]
    fn unknown_exempted_rules_are_warned_about() {
        let mut engine = AnalysisEngine::new();
        engine.set_exemptions(
            parse_exemption_config(
                "/p/exemptions.json",
                "{\n  \"ban-eval-calls\": [\"a.ts\"],\n  \"ban-everything\": [\"b.ts\"]\n}".to_string(),
            ),
            "/p/exemptions.json",
        );

        let warnings = engine.exemption_diagnostics();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].rule_id, EXEMPTION_RULE_ID);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert!(warnings[0].message.contains("ban-everything"));
        assert_eq!(warnings[0].line, 3);
    }

    #[test]
    fn checker_cache_is_keyed_by_program() {
        let engine = AnalysisEngine::new();
        let first = program(&[("/p/app.ts", "eval('1');")]);
        let second = program(&[("/p/app.ts", "eval('1');")]);
        let mut cache = CheckerCache::new();

        let a = cache.get_or_build(&engine, &first);
        let b = cache.get_or_build(&engine, &first);
        let c = cache.get_or_build(&engine, &second);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert!(cache.invalidate(first.id()));
        assert!(!cache.invalidate(first.id()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_checkers_give_identical_results() {
        let engine = AnalysisEngine::new();
        let program = program(&[("/p/app.ts", "eval('1');\nnew Worker('/w.js');")]);
        let mut cache = CheckerCache::new();
        let file = program.file_by_path("/p/app.ts").unwrap();

        let first = engine.check_file(&cache.get_or_build(&engine, &program), file);
        let second = engine.check_file(&cache.get_or_build(&engine, &program), file);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn exemption_config_prefers_tool_config() {
        let dir = tempfile::tempdir().unwrap();
        let tsconfig = dir.path().join("tsconfig.json");
        fs::write(
            &tsconfig,
            r#"{ "compilerOptions": { "plugins": [{ "name": "tsgate", "exemptionConfig": "./from-tsconfig.json" }] } }"#,
        )
        .unwrap();
        let mut config = Config::default();

        assert_eq!(
            find_exemption_config(&config, dir.path(), Some(&tsconfig)),
            Some(dir.path().join("./from-tsconfig.json"))
        );

        config.exemptions.config = Some(PathBuf::from("exemptions.json"));
        assert_eq!(
            find_exemption_config(&config, dir.path(), Some(&tsconfig)),
            Some(dir.path().join("exemptions.json"))
        );
    }

    #[test]
    fn load_exemptions_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exemptions.json");
        fs::write(&path, r#"{ "ban-eval-calls": ["src/*.ts"] }"#).unwrap();
        let mut engine = AnalysisEngine::new();

        engine.load_exemptions(&path).unwrap();

        assert!(engine.exemption_diagnostics().is_empty());
        assert!(
            engine
                .exemptions()
                .is_exempted("ban-eval-calls", &dir.path().join("src/a.ts").to_string_lossy())
        );
        assert!(engine.load_exemptions(&dir.path().join("missing.json")).is_err());
    }
}
