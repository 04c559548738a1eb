//! Conformance patterns declared in `tsgate.toml`.

use std::borrow::Cow;

use super::pattern::{PatternConfig, PatternKind, PatternRule, RuleBuildError};
use super::trusted_types::policy_suggestion;
use super::{Rule, RuleMetadata, Severity};
use crate::config::{CustomRuleConfig, PatternKindValue};

impl From<PatternKindValue> for PatternKind {
    fn from(value: PatternKindValue) -> Self {
        match value {
            PatternKindValue::BannedName => PatternKind::BannedName,
            PatternKindValue::BannedProperty => PatternKind::BannedProperty,
            PatternKindValue::BannedPropertyWrite => PatternKind::BannedPropertyWrite,
            PatternKindValue::BannedImportedName => PatternKind::BannedImportedName,
        }
    }
}

/// Builds the rule for the `index`-th custom rule entry. Custom rule ids are
/// `TC001`, `TC002`, ... in declaration order.
pub fn build_custom_rule(index: usize, config: &CustomRuleConfig) -> Result<PatternRule, RuleBuildError> {
    let metadata = RuleMetadata {
        id: Cow::Owned(format!("TC{:03}", index + 1)),
        name: Cow::Owned(config.name.clone()),
        description: Cow::Owned(config.message.clone()),
        severity: Severity::Error,
        docs_url: None,
        examples: None,
    };

    let values: Vec<&str> = config.values.iter().map(String::as_str).collect();
    let mut pattern = PatternConfig::new(config.kind.into(), &values, config.message.as_str());
    if let Some(trusted_type) = &config.allowed_trusted_type {
        pattern = pattern.allowing(trusted_type);
    }
    let suggestion = config
        .suggestion
        .clone()
        .or_else(|| config.allowed_trusted_type.as_deref().and_then(policy_suggestion));
    if let Some(suggestion) = suggestion {
        pattern = pattern.suggesting(suggestion);
    }

    PatternRule::new(metadata, pattern)?.with_allowlist(&config.allowlist)
}

/// Builds every custom rule, collecting the malformed ones instead of
/// stopping at the first.
pub fn custom_rules(configs: &[CustomRuleConfig]) -> (Vec<Box<dyn Rule>>, Vec<RuleBuildError>) {
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    let mut errors = Vec::new();

    for (index, config) in configs.iter().enumerate() {
        match build_custom_rule(index, config) {
            Ok(rule) => rules.push(Box::new(rule)),
            Err(e) => errors.push(e),
        }
    }

    (rules, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::AllowlistEntry;
    use crate::rules::pattern::tests::{run_rule_on, suggestions_of};

    fn custom(name: &str, kind: PatternKindValue, values: &[&str]) -> CustomRuleConfig {
        CustomRuleConfig {
            name: name.to_string(),
            kind,
            values: values.iter().map(|v| v.to_string()).collect(),
            message: format!("{name} is banned"),
            allowed_trusted_type: None,
            suggestion: None,
            allowlist: Vec::new(),
        }
    }

    #[test]
    fn ids_follow_declaration_order() {
        let (rules, errors) = custom_rules(&[
            custom("ban-a", PatternKindValue::BannedName, &["GLOBAL|alert"]),
            custom("ban-b", PatternKindValue::BannedProperty, &["Element.prototype.outerText"]),
        ]);

        assert!(errors.is_empty());
        let ids: Vec<_> = rules.iter().map(|r| r.metadata().id.to_string()).collect();
        assert_eq!(ids, vec!["TC001", "TC002"]);
        assert_eq!(rules[1].metadata().name, "ban-b");
        assert_eq!(rules[1].metadata().severity, Severity::Error);
    }

    #[test]
    fn malformed_rules_are_collected_and_skipped() {
        let (rules, errors) = custom_rules(&[
            custom("bad-scope", PatternKindValue::BannedName, &["alert"]),
            custom("good", PatternKindValue::BannedName, &["GLOBAL|alert"]),
            custom("empty", PatternKindValue::BannedProperty, &[]),
        ]);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].metadata().id, "TC002", "ids keep their position");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("bad-scope"));
        assert!(matches!(errors[1], RuleBuildError::NoValues { .. }));
    }

    #[test]
    fn custom_rules_honor_the_allowed_trusted_type() {
        let mut config = custom("ban-legacy-widget", PatternKindValue::BannedName, &["ANY_SYMBOL|legacyWidget"]);
        config.allowed_trusted_type = Some("TrustedHTML".to_string());
        let rule = build_custom_rule(0, &config).unwrap();

        let failures = run_rule_on(
            &rule,
            &[(
                "/p/app.ts",
                "declare function legacyWidget(html: string | TrustedHTML): void;\n\
                 declare const safe: TrustedHTML;\n\
                 legacyWidget('<b>');\n\
                 legacyWidget(safe);",
            )],
        );

        assert_eq!(failures, vec!["legacyWidget"]);
    }

    #[test]
    fn suggestions_default_to_the_policy_call() {
        let mut config = custom("ban-legacy-widget", PatternKindValue::BannedName, &["ANY_SYMBOL|legacyWidget"]);
        config.allowed_trusted_type = Some("TrustedHTML".to_string());
        let source = "declare function legacyWidget(html: string | TrustedHTML): void;\nlegacyWidget('<b>');";

        let derived = suggestions_of(&build_custom_rule(0, &config).unwrap(), source);
        config.suggestion = Some("Render with SafeWidget".to_string());
        let explicit = suggestions_of(&build_custom_rule(0, &config).unwrap(), source);

        assert_eq!(
            derived,
            vec![Some("Create the value with a Trusted Types policy: policy.createHTML(value)".to_string())]
        );
        assert_eq!(explicit, vec![Some("Render with SafeWidget".to_string())]);
    }

    #[test]
    fn rule_allowlists_are_compiled() {
        let mut config = custom("ban-alert", PatternKindValue::BannedName, &["GLOBAL|alert"]);
        config.allowlist = vec![AllowlistEntry {
            regexp: vec!["/legacy/".to_string()],
            ..Default::default()
        }];
        let rule = build_custom_rule(0, &config).unwrap();

        let allowlist = rule.allowlist().expect("allowlist configured");
        assert!(allowlist.is_allowlisted("/p/legacy/a.ts"));
        assert!(!allowlist.is_allowlisted("/p/src/a.ts"));

        config.allowlist[0].regexp = vec!["(".to_string()];
        assert!(matches!(
            build_custom_rule(0, &config),
            Err(RuleBuildError::Allowlist { .. })
        ));
    }
}
