//! Matching of property accesses by receiver type.

use std::collections::HashSet;

use super::{MatcherError, dealias};
use crate::semantic::{SymbolId, Type, TypeResolver};

/// Matches `Type.prototype.member` specs against property accesses whose
/// receiver is an instance of `Type` or of a type derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMatcher {
    banned_type: String,
    banned_property: String,
}

impl PropertyMatcher {
    pub fn from_spec(spec: &str) -> Result<Self, MatcherError> {
        let (banned_type, banned_property) = spec
            .split_once(".prototype.")
            .filter(|(ty, property)| {
                !ty.is_empty() && !property.is_empty() && !property.contains('.')
            })
            .ok_or_else(|| MatcherError::MissingPrototype(spec.to_string()))?;

        Ok(Self {
            banned_type: banned_type.to_string(),
            banned_property: banned_property.to_string(),
        })
    }

    pub fn banned_type(&self) -> &str {
        &self.banned_type
    }

    pub fn banned_property(&self) -> &str {
        &self.banned_property
    }

    /// Whether a receiver of type `ty` is, or may be, the banned type.
    ///
    /// Every member of a union or intersection is considered, so a receiver
    /// typed `HTMLScriptElement | null` still matches.
    pub fn type_matches(&self, ty: &Type, resolver: &dyn TypeResolver) -> bool {
        ty.constituents().iter().any(|constituent| match constituent {
            Type::Object(id) => self.symbol_matches(*id, resolver, &mut HashSet::new()),
            _ => false,
        })
    }

    fn symbol_matches(
        &self,
        id: SymbolId,
        resolver: &dyn TypeResolver,
        visited: &mut HashSet<SymbolId>,
    ) -> bool {
        let id = dealias(resolver, id);
        if !visited.insert(id) {
            return false;
        }
        if resolver.fully_qualified_name(id) == self.banned_type {
            return true;
        }
        resolver
            .base_types(id)
            .iter()
            .any(|&base| self.symbol_matches(base, resolver, visited))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::program::Program;
    use crate::semantic::ProgramResolver;

    fn resolver(source: &str) -> ProgramResolver {
        let program = Program::builder().add_source("/p/app.ts", source).build();
        ProgramResolver::new(Arc::new(program))
    }

    fn object(resolver: &ProgramResolver, name: &str) -> Type {
        resolver.declared_type(resolver.global_symbol(name).unwrap())
    }

    #[test]
    fn splits_on_prototype() {
        let matcher = PropertyMatcher::from_spec("Element.prototype.innerHTML").unwrap();

        assert_eq!(matcher.banned_type(), "Element");
        assert_eq!(matcher.banned_property(), "innerHTML");
    }

    #[test]
    fn spec_without_prototype_is_rejected() {
        for spec in ["Element.innerHTML", ".prototype.innerHTML", "Element.prototype.", "A.prototype.b.c"] {
            assert!(
                matches!(PropertyMatcher::from_spec(spec), Err(MatcherError::MissingPrototype(_))),
                "{spec} should be rejected"
            );
        }
    }

    #[test]
    fn matches_derived_types() {
        let resolver = resolver("");
        let matcher = PropertyMatcher::from_spec("Element.prototype.innerHTML").unwrap();

        assert!(matcher.type_matches(&object(&resolver, "Element"), &resolver));
        assert!(matcher.type_matches(&object(&resolver, "HTMLDivElement"), &resolver));
        assert!(!matcher.type_matches(&object(&resolver, "ShadowRoot"), &resolver));
        assert!(!matcher.type_matches(&object(&resolver, "Document"), &resolver));
    }

    #[test]
    fn checks_every_union_member() {
        let resolver = resolver("");
        let matcher = PropertyMatcher::from_spec("HTMLScriptElement.prototype.src").unwrap();
        let script_or_null = Type::union(vec![object(&resolver, "HTMLScriptElement"), Type::Null]);
        let image_or_null = Type::union(vec![object(&resolver, "HTMLImageElement"), Type::Null]);

        assert!(matcher.type_matches(&script_or_null, &resolver));
        assert!(!matcher.type_matches(&image_or_null, &resolver));
        assert!(!matcher.type_matches(&Type::Any, &resolver));
        assert!(!matcher.type_matches(&Type::String, &resolver));
    }

    #[test]
    fn user_types_extending_library_types_match() {
        let resolver = resolver("interface FancyElement extends HTMLElement { fancy: boolean }");
        let matcher = PropertyMatcher::from_spec("Element.prototype.outerHTML").unwrap();

        assert!(matcher.type_matches(&object(&resolver, "FancyElement"), &resolver));
    }

    #[test]
    fn heritage_cycles_terminate() {
        let resolver = resolver("interface A extends B {}\ninterface B extends A {}");
        let matcher = PropertyMatcher::from_spec("Element.prototype.innerHTML").unwrap();

        assert!(!matcher.type_matches(&object(&resolver, "A"), &resolver));
    }
}
