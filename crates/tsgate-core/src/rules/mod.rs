//! Rule system for Trusted Types conformance checks
//!
//! A rule never inspects a file by itself: it registers handlers with a
//! [`Checker`](crate::checker::Checker), which dispatches to them during its
//! single walk. The registry decides which rules take part in a run and how
//! their failures are reported.

pub mod builtin;
pub mod custom;
pub mod pattern;
pub mod trusted_types;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::allowlist::Allowlist;
use crate::checker::RuleRegistrar;
use crate::config::RulesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn level(&self) -> u8 {
        match self {
            Severity::Error => 4,
            Severity::Warning => 3,
            Severity::Info => 2,
            Severity::Hint => 1,
        }
    }
}

impl Confidence {
    pub fn level(&self) -> u8 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: Cow<'static, str>,
    /// Stable name used as failure provenance and exemption key.
    pub name: Cow<'static, str>,
    pub description: Cow<'static, str>,
    pub severity: Severity,
    pub docs_url: Option<&'static str>,
    pub examples: Option<&'static str>,
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    /// Files exempted by the rule's own configuration.
    fn allowlist(&self) -> Option<&Allowlist> {
        None
    }

    /// Subscribes the rule's handlers. Called once per checker.
    fn register(&self, registrar: &mut RuleRegistrar<'_>);
}

pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    disabled_rules: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
    min_confidence: Confidence,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
            min_confidence: Confidence::Low,
        }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.disabled_rules.clear();
        self.severity_overrides.clear();

        for rule_ref in &config.disabled {
            self.disabled_rules.insert(rule_ref.clone());
        }

        for (rule_ref, severity_value) in &config.severity {
            self.severity_overrides
                .insert(rule_ref.clone(), (*severity_value).into());
        }

        self.min_confidence = config
            .min_confidence
            .map_or(Confidence::Low, Confidence::from);
    }

    pub fn set_min_confidence(&mut self, confidence: Confidence) {
        self.min_confidence = confidence;
    }

    pub fn min_confidence(&self) -> Confidence {
        self.min_confidence
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Rules that take part in a run, in registration order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules().filter(|rule| self.should_run_rule(*rule))
    }

    fn should_run_rule(&self, rule: &dyn Rule) -> bool {
        !self.is_rule_disabled(rule.metadata())
    }

    fn is_rule_disabled(&self, metadata: &RuleMetadata) -> bool {
        self.disabled_rules.contains(metadata.id.as_ref())
            || self.disabled_rules.contains(metadata.name.as_ref())
    }

    /// Reported severity of a rule, after overrides by id, then by name.
    pub fn severity_for(&self, rule: &dyn Rule) -> Severity {
        let metadata = rule.metadata();

        self.severity_overrides
            .get(metadata.id.as_ref())
            .or_else(|| self.severity_overrides.get(metadata.name.as_ref()))
            .copied()
            .unwrap_or(metadata.severity)
    }

    pub fn is_rule_enabled(&self, id_or_name: &str) -> bool {
        if let Some(rule) = self
            .get_rule(id_or_name)
            .or_else(|| self.get_rule_by_name(id_or_name))
        {
            self.should_run_rule(rule)
        } else {
            false
        }
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().id == id)
            .map(|r| r.as_ref())
    }

    pub fn get_rule_by_name(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().name == name)
            .map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        severity = $sev:ident
        $(, docs_url = $url:literal)?
        $(, examples = $examples:literal)?
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::rules::RuleMetadata {
                        id: ::std::borrow::Cow::Borrowed($id),
                        name: ::std::borrow::Cow::Borrowed($rule_name),
                        description: ::std::borrow::Cow::Borrowed($desc),
                        severity: $crate::rules::Severity::$sev,
                        docs_url: $crate::declare_rule!(@docs_url $($url)?),
                        examples: $crate::declare_rule!(@examples $($examples)?),
                    },
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (@docs_url $url:literal) => { Some($url) };
    (@docs_url) => { None };
    (@examples $examples:literal) => { Some($examples) };
    (@examples) => { None };
}
