//! Semantic analysis module
//!
//! Provides the type-resolution capability the checker runs against: symbol
//! resolution, fully-qualified names, types at expressions, alias resolution
//! and module resolution.

mod binder;
pub mod resolver;
pub mod scope;
pub mod symbols;
pub mod types;

use swc_common::Span;
use swc_ecma_ast::{Expr, MemberExpr};

use crate::program::FileId;

pub use resolver::ProgramResolver;
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbols::{Declaration, Symbol, SymbolId, SymbolKind, SymbolTable};
pub use types::{Signature, Type};

/// Identity of a node within a program: its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanKey {
    lo: u32,
    hi: u32,
}

impl From<Span> for SpanKey {
    fn from(span: Span) -> Self {
        SpanKey {
            lo: span.lo.0,
            hi: span.hi.0,
        }
    }
}

/// Type-resolution capability consumed by matchers and rules.
///
/// Every query is total: a node the resolver knows nothing about yields
/// `None` or [`Type::Unknown`].
pub trait TypeResolver: Send + Sync {
    /// Symbol declared or referenced by the identifier at `span`.
    fn symbol_at(&self, span: Span) -> Option<SymbolId>;

    /// Symbol of the property accessed by `member`.
    fn property_symbol(&self, member: &MemberExpr) -> Option<SymbolId>;

    fn symbol(&self, id: SymbolId) -> &Symbol;

    /// Target of an import or re-export symbol, one step at a time.
    fn aliased_symbol(&self, id: SymbolId) -> Option<SymbolId>;

    fn fully_qualified_name(&self, id: SymbolId) -> String;

    fn type_of_expr(&self, expr: &Expr) -> Type;

    /// Direct base classes and extended interfaces.
    fn base_types(&self, id: SymbolId) -> &[SymbolId];

    fn resolve_module(&self, importer: FileId, specifier: &str) -> Option<FileId>;

    fn file_path(&self, file: FileId) -> &str;

    /// Whether `file` is part of the bundled standard library.
    fn is_default_lib(&self, file: FileId) -> bool;
}
