//! Matchers decide whether a node refers to a banned API.
//!
//! Both matchers are pure functions of the node and the type resolver and can
//! be shared freely between rules and threads.

mod absolute;
mod property;

use std::collections::HashSet;

pub use absolute::{AbsoluteMatcher, MatcherScope};
pub use property::PropertyMatcher;

use crate::semantic::{SymbolId, TypeResolver};

const MAX_ALIAS_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Malformed matcher spec '{0}': expected '<scope>|<dotted.name>'")]
    MissingScope(String),

    #[error("Malformed matcher spec '{0}': '.prototype.' names a property, use a property matcher")]
    PrototypeInName(String),

    #[error("Malformed property spec '{0}': expected '<Type>.prototype.<member>'")]
    MissingPrototype(String),

    #[error("Invalid scope pattern in matcher spec '{spec}': {source}")]
    InvalidScope {
        spec: String,
        #[source]
        source: regex::Error,
    },
}

/// Follows import and re-export aliases to the symbol they stand for.
///
/// Resolution stops at the first symbol seen twice, so circular re-exports
/// resolve to a symbol on the cycle instead of looping.
pub fn dealias(resolver: &dyn TypeResolver, id: SymbolId) -> SymbolId {
    let mut current = id;
    let mut visited = HashSet::new();
    while visited.len() < MAX_ALIAS_DEPTH && visited.insert(current) {
        match resolver.aliased_symbol(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::program::Program;
    use crate::semantic::ProgramResolver;

    #[test]
    fn dealias_terminates_on_alias_cycles() {
        let program = Program::builder()
            .without_default_lib()
            .add_source("/p/a.ts", "export { loop } from './b';")
            .add_source("/p/b.ts", "export { loop } from './a';")
            .add_source("/p/app.ts", "import { loop } from './a';\nloop;")
            .build();
        let resolver = ProgramResolver::new(Arc::new(program));
        let file = resolver.program().file_by_path("/p/app.ts").unwrap();
        let module = file.module().unwrap();
        let swc_ecma_ast::ModuleItem::Stmt(swc_ecma_ast::Stmt::Expr(stmt)) = &module.body[1] else {
            panic!("expected expression statement");
        };
        let swc_ecma_ast::Expr::Ident(ident) = &*stmt.expr else {
            panic!("expected identifier");
        };
        let alias = resolver.symbol_at(ident.span).unwrap();

        let target = dealias(&resolver, alias);
        assert_eq!(resolver.symbol(target).name, "loop");
    }

    #[test]
    fn dealias_of_plain_symbol_is_identity() {
        let program = Program::builder().add_source("app.ts", "eval;").build();
        let resolver = ProgramResolver::new(Arc::new(program));
        let eval = resolver.global_symbol("eval").unwrap();

        assert_eq!(dealias(&resolver, eval), eval);
    }
}
