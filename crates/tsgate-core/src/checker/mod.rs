//! Checker dispatch core.
//!
//! Rules register handlers once; `execute` then walks a file a single time
//! and hands every node, name and property occurrence to the handlers
//! subscribed to it. Handlers are keyed four ways: by node kind, by
//! identifier text, by property name, and by the string key of a bracket
//! access such as `el['innerHTML']`.

mod context;
mod node;
mod walker;

use std::collections::HashMap;
use std::sync::Arc;

use swc_ecma_visit::VisitWith;
use tracing::debug;

pub use context::RuleContext;
pub use node::{NameOccurrence, NameSite, Node, NodeKind, PropertyOccurrence, Usage};

use crate::allowlist::Allowlist;
use crate::failure::CheckResult;
use crate::program::SourceFile;
use crate::rules::Rule;
use crate::rules::trusted_types::TrustedTypes;
use crate::semantic::TypeResolver;
use context::FailureSink;
use walker::Walker;

pub type NodeHandler = Box<dyn Fn(&mut RuleContext<'_>, Node<'_>) + Send + Sync>;
pub type NameHandler = Box<dyn Fn(&mut RuleContext<'_>, &NameOccurrence<'_>) + Send + Sync>;
pub type PropertyHandler =
    Box<dyn Fn(&mut RuleContext<'_>, &PropertyOccurrence<'_>) + Send + Sync>;

/// Provenance and exemptions shared by every handler of one rule.
#[derive(Debug)]
pub(crate) struct RuleScope {
    pub name: String,
    pub allowlist: Allowlist,
}

pub(crate) struct Registered<H> {
    pub scope: Arc<RuleScope>,
    pub handler: H,
}

pub struct Checker {
    resolver: Arc<dyn TypeResolver>,
    trusted_types: TrustedTypes,
    node_handlers: HashMap<NodeKind, Vec<Registered<NodeHandler>>>,
    name_handlers: HashMap<String, Vec<Registered<NameHandler>>>,
    property_handlers: HashMap<String, Vec<Registered<PropertyHandler>>>,
    element_handlers: HashMap<String, Vec<Registered<PropertyHandler>>>,
    rules: Vec<String>,
}

impl std::fmt::Debug for Checker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker")
            .field("rules", &self.rules)
            .field("trusted_types", &self.trusted_types)
            .finish_non_exhaustive()
    }
}

impl Checker {
    pub fn new(resolver: Arc<dyn TypeResolver>) -> Self {
        Self {
            resolver,
            trusted_types: TrustedTypes::default(),
            node_handlers: HashMap::new(),
            name_handlers: HashMap::new(),
            property_handlers: HashMap::new(),
            element_handlers: HashMap::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_trusted_types(mut self, trusted_types: TrustedTypes) -> Self {
        self.trusted_types = trusted_types;
        self
    }

    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    /// Lets `rule` subscribe its handlers. Failures it reports in files on
    /// `allowlist` are exempted.
    pub fn register(&mut self, rule: &dyn Rule, allowlist: Allowlist) {
        let name = rule.metadata().name.to_string();
        let scope = Arc::new(RuleScope {
            name: name.clone(),
            allowlist,
        });
        let mut registrar = RuleRegistrar {
            checker: self,
            scope,
        };
        rule.register(&mut registrar);
        debug!(rule = %name, "registered rule");
        self.rules.push(name);
    }

    /// Names of the registered rules, in registration order.
    pub fn rule_names(&self) -> &[String] {
        &self.rules
    }

    /// Walks `file` once and collects the failures of every registered rule.
    ///
    /// Every call starts from an empty result, so repeated runs over the same
    /// file yield the same failures. Declaration files and the bundled
    /// library are never checked.
    pub fn execute(&self, file: &SourceFile, report_exempted: bool) -> CheckResult {
        if file.is_declaration() || file.is_default_lib() {
            debug!(file = %file.path(), "skipping declaration file");
            return CheckResult::default();
        }
        let Some(module) = file.module() else {
            debug!(file = %file.path(), "skipping file without a syntax tree");
            return CheckResult::default();
        };

        let mut walker = Walker::new(self, file, FailureSink::new(report_exempted));
        module.visit_with(&mut walker);
        let sink = walker.finish();

        debug!(
            file = %file.path(),
            failures = sink.failures.len(),
            exempted = sink.exempted.len(),
            "checked file"
        );
        CheckResult {
            failures: sink.failures,
            exempted_failures: sink.exempted,
        }
    }
}

/// Registration surface handed to [`Rule::register`].
pub struct RuleRegistrar<'c> {
    checker: &'c mut Checker,
    scope: Arc<RuleScope>,
}

impl RuleRegistrar<'_> {
    pub fn rule_name(&self) -> &str {
        &self.scope.name
    }

    pub fn on_node(
        &mut self,
        kind: NodeKind,
        handler: impl Fn(&mut RuleContext<'_>, Node<'_>) + Send + Sync + 'static,
    ) {
        let registered = Registered {
            scope: Arc::clone(&self.scope),
            handler: Box::new(handler) as NodeHandler,
        };
        self.checker
            .node_handlers
            .entry(kind)
            .or_default()
            .push(registered);
    }

    /// Subscribes to references of `name` and to dot accesses named `name`.
    pub fn on_named_identifier(
        &mut self,
        name: &str,
        handler: impl Fn(&mut RuleContext<'_>, &NameOccurrence<'_>) + Send + Sync + 'static,
    ) {
        let registered = Registered {
            scope: Arc::clone(&self.scope),
            handler: Box::new(handler) as NameHandler,
        };
        self.checker
            .name_handlers
            .entry(name.to_string())
            .or_default()
            .push(registered);
    }

    pub fn on_named_property_access(
        &mut self,
        name: &str,
        handler: impl Fn(&mut RuleContext<'_>, &PropertyOccurrence<'_>) + Send + Sync + 'static,
    ) {
        let registered = Registered {
            scope: Arc::clone(&self.scope),
            handler: Box::new(handler) as PropertyHandler,
        };
        self.checker
            .property_handlers
            .entry(name.to_string())
            .or_default()
            .push(registered);
    }

    /// Subscribes to bracket accesses keyed by the string literal `key`.
    pub fn on_string_literal_element_access(
        &mut self,
        key: &str,
        handler: impl Fn(&mut RuleContext<'_>, &PropertyOccurrence<'_>) + Send + Sync + 'static,
    ) {
        let registered = Registered {
            scope: Arc::clone(&self.scope),
            handler: Box::new(handler) as PropertyHandler,
        };
        self.checker
            .element_handlers
            .entry(key.to_string())
            .or_default()
            .push(registered);
    }
}
