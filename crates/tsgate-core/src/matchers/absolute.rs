//! Matching of names by their fully-qualified, dealiased symbol.

use regex::Regex;

use super::{MatcherError, dealias};
use crate::checker::NameSite;
use crate::semantic::{SymbolId, TypeResolver};

/// Where the matched symbol must be declared.
#[derive(Debug, Clone)]
pub enum MatcherScope {
    /// Language built-ins and the bundled standard library.
    Global,
    AnySymbol,
    Closure,
    /// Files whose path contains a match of the pattern.
    Path(Regex),
}

/// Matches `<scope>|<dotted.name>` specs such as `GLOBAL|eval` or
/// `/node_modules/safevalues/restricted/legacy|legacyUnsafeHtml`.
#[derive(Debug, Clone)]
pub struct AbsoluteMatcher {
    spec: String,
    scope: MatcherScope,
    name: String,
    match_import: bool,
}

impl AbsoluteMatcher {
    pub fn new(spec: &str) -> Result<Self, MatcherError> {
        Self::with_import_matching(spec, false)
    }

    /// Also matches unrenamed import specifiers when `match_import` is set.
    /// Renamed imports always match, since the local name hides the banned one.
    pub fn with_import_matching(spec: &str, match_import: bool) -> Result<Self, MatcherError> {
        let (scope, name) = spec
            .split_once('|')
            .filter(|(scope, name)| !scope.is_empty() && is_dotted_name(name))
            .ok_or_else(|| MatcherError::MissingScope(spec.to_string()))?;

        if name.contains(".prototype.") {
            return Err(MatcherError::PrototypeInName(spec.to_string()));
        }

        let scope = match scope {
            "GLOBAL" => MatcherScope::Global,
            "ANY_SYMBOL" => MatcherScope::AnySymbol,
            "CLOSURE" => MatcherScope::Closure,
            path => MatcherScope::Path(Regex::new(path).map_err(|source| {
                MatcherError::InvalidScope {
                    spec: spec.to_string(),
                    source,
                }
            })?),
        };

        Ok(Self {
            spec: spec.to_string(),
            scope,
            name: name.to_string(),
            match_import,
        })
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn scope(&self) -> &MatcherScope {
        &self.scope
    }

    /// The dotted name, e.g. `Document.write`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the dotted name: the identifier text to dispatch on.
    pub fn bare_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn matches(&self, site: &NameSite<'_>, resolver: &dyn TypeResolver) -> bool {
        let symbol = match *site {
            NameSite::Reference(ident) => match resolver.symbol_at(ident.span) {
                Some(id) => id,
                // Nothing declares it: a built-in the bundled library leaves out.
                None => {
                    return matches!(self.scope, MatcherScope::Global)
                        && self.name == ident.sym.as_ref();
                }
            },
            NameSite::Property(member) => match resolver.property_symbol(member) {
                Some(id) => id,
                None => return false,
            },
            NameSite::ImportedName {
                specifier, renamed, ..
            } => {
                if !renamed && !self.match_import {
                    return false;
                }
                match resolver.symbol_at(specifier.local.span) {
                    Some(id) => id,
                    None => return false,
                }
            }
        };
        self.matches_symbol(symbol, resolver)
    }

    pub fn matches_symbol(&self, id: SymbolId, resolver: &dyn TypeResolver) -> bool {
        let id = dealias(resolver, id);
        if !self.name_matches(&resolver.fully_qualified_name(id)) {
            return false;
        }

        let declarations = &resolver.symbol(id).declarations;
        match &self.scope {
            MatcherScope::Global => {
                declarations.is_empty()
                    || declarations.iter().any(|d| resolver.is_default_lib(d.file))
            }
            MatcherScope::AnySymbol | MatcherScope::Closure => true,
            MatcherScope::Path(pattern) => declarations
                .iter()
                .any(|d| pattern.is_match(resolver.file_path(d.file))),
        }
    }

    /// Exact match, or a match after a quoted module path: `"/a/b".name`.
    fn name_matches(&self, fqn: &str) -> bool {
        fqn == self.name
            || fqn
                .strip_suffix(self.name.as_str())
                .is_some_and(|prefix| prefix.ends_with("\"."))
    }
}

fn is_dotted_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}
