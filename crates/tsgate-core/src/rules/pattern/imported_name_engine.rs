//! Engine for names imported from banned modules.

use std::sync::Arc;

use regex::Regex;
use swc_ecma_ast::{ImportDecl, ImportSpecifier, ModuleExportName};

use super::{PatternConfig, RuleBuildError};
use crate::checker::{Node, NodeKind, RuleContext, RuleRegistrar};

/// A `<module-path-regex>|<exported-name>` value. The name `*` stands for
/// the whole module.
#[derive(Debug, Clone)]
pub struct ImportPattern {
    module: Regex,
    name: String,
}

impl ImportPattern {
    pub(super) fn parse(rule: &str, value: &str) -> Result<Self, RuleBuildError> {
        // The module pattern may itself contain `|`.
        let (module, name) = value
            .rsplit_once('|')
            .filter(|(module, name)| !module.is_empty() && !name.is_empty())
            .ok_or_else(|| RuleBuildError::ImportPattern {
                rule: rule.to_string(),
                value: value.to_string(),
            })?;
        let module = Regex::new(module).map_err(|source| RuleBuildError::ModulePattern {
            rule: rule.to_string(),
            value: value.to_string(),
            source,
        })?;

        Ok(Self {
            module,
            name: name.to_string(),
        })
    }

    pub fn module(&self) -> &Regex {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn bans(&self, module_path: &str, imported: &str) -> bool {
        self.module.is_match(module_path) && (self.name == "*" || self.name == imported)
    }
}

pub(super) fn register(
    registrar: &mut RuleRegistrar<'_>,
    patterns: &Arc<Vec<ImportPattern>>,
    config: &Arc<PatternConfig>,
) {
    let patterns = Arc::clone(patterns);
    let config = Arc::clone(config);
    registrar.on_node(NodeKind::ImportDecl, move |ctx, node| {
        if let Node::Import(import) = node {
            check(ctx, import, &patterns, &config);
        }
    });
}

fn check(ctx: &mut RuleContext<'_>, import: &ImportDecl, patterns: &[ImportPattern], config: &PatternConfig) {
    if import.type_only {
        return;
    }
    let specifier = import.src.value.to_string();
    let resolver = ctx.resolver();
    let module_path = resolver
        .resolve_module(ctx.file().id(), &specifier)
        .map(|file| resolver.file_path(file).to_string());

    if import.specifiers.is_empty() {
        match module_path {
            None => ctx.add_failure(import.span, format!("Cannot find module '{specifier}'")),
            Some(path) if patterns.iter().any(|p| p.module.is_match(&path)) => {
                config.report(ctx, import.span)
            }
            Some(_) => {}
        }
        return;
    }

    // Unresolvable named imports are a compiler error, reported elsewhere.
    let Some(path) = module_path else {
        return;
    };
    for specifier in &import.specifiers {
        let (banned, span) = match specifier {
            ImportSpecifier::Named(named) if !named.is_type_only => {
                let imported = match &named.imported {
                    Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                    Some(ModuleExportName::Str(name)) => name.value.to_string(),
                    None => named.local.sym.to_string(),
                };
                (patterns.iter().any(|p| p.bans(&path, &imported)), named.span)
            }
            ImportSpecifier::Named(_) => continue,
            ImportSpecifier::Default(default) => {
                (patterns.iter().any(|p| p.bans(&path, "default")), default.span)
            }
            ImportSpecifier::Namespace(namespace) => (
                patterns.iter().any(|p| p.module.is_match(&path)),
                namespace.span,
            ),
        };
        if banned {
            config.report(ctx, span);
        }
    }
}
