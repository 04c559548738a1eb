//! Symbol table for declarations across a program
//!
//! Declarations of the same name in the same scope merge into one symbol, the
//! way interface and variable declarations of the standard library merge.
//! Class, interface and namespace members are symbols too, reachable from
//! their container rather than from a scope.

use std::collections::HashMap;

use id_arena::{Arena, Id};
use swc_common::Span;
use swc_ecma_ast::TsType;

use super::SpanKey;
use super::scope::{ScopeId, ScopeTree};
use super::types::{Shape, SignatureSource};
use crate::program::FileId;

pub type SymbolId = Id<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    Interface,
    TypeAlias,
    Namespace,
    Property,
    Method,
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub file: FileId,
    pub span: Span,
    pub kind: SymbolKind,
}

/// Where an import or re-export points before module resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AliasTarget {
    Export {
        file: FileId,
        specifier: String,
        name: String,
    },
    Namespace {
        file: FileId,
        specifier: String,
    },
}

#[derive(Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub declarations: Vec<Declaration>,
    /// Enclosing class, interface or namespace.
    pub parent: Option<SymbolId>,
    pub scope: Option<ScopeId>,
    pub(crate) members: HashMap<String, SymbolId>,
    pub(crate) heritage: Vec<SpanKey>,
    pub(crate) bases: Vec<SymbolId>,
    pub(crate) alias: Option<AliasTarget>,
    pub(crate) aliased: Option<SymbolId>,
    pub(crate) aliased_module: Option<FileId>,
    pub(crate) annotation: Option<Box<TsType>>,
    pub(crate) initializer: Option<Shape>,
    pub(crate) type_definition: Option<Box<TsType>>,
    pub(crate) signatures: Vec<SignatureSource>,
}

impl Symbol {
    fn new(id: SymbolId, name: &str, declaration: Declaration) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: declaration.kind,
            declarations: vec![declaration],
            parent: None,
            scope: None,
            members: HashMap::new(),
            heritage: Vec::new(),
            bases: Vec::new(),
            alias: None,
            aliased: None,
            aliased_module: None,
            annotation: None,
            initializer: None,
            type_definition: None,
            signatures: Vec::new(),
        }
    }

    pub fn has_kind(&self, kind: SymbolKind) -> bool {
        self.declarations.iter().any(|d| d.kind == kind)
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn member(&self, name: &str) -> Option<SymbolId> {
        self.members.get(name).copied()
    }

    pub fn bases(&self) -> &[SymbolId] {
        &self.bases
    }
}

pub struct SymbolTable {
    arena: Arena<Symbol>,
    by_scope: HashMap<ScopeId, HashMap<String, SymbolId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_scope: HashMap::new(),
        }
    }

    /// Declares `name` in `scope`, merging with an existing symbol of that name.
    pub fn declare(&mut self, name: &str, scope: ScopeId, declaration: Declaration) -> SymbolId {
        if let Some(&existing) = self.by_scope.get(&scope).and_then(|s| s.get(name)) {
            self.arena[existing].declarations.push(declaration);
            return existing;
        }

        let id = self
            .arena
            .alloc_with_id(|id| Symbol::new(id, name, declaration));
        self.arena[id].scope = Some(scope);
        self.by_scope
            .entry(scope)
            .or_default()
            .insert(name.to_string(), id);
        id
    }

    /// Declares `name` as a member of `container`, merging overloads.
    pub fn declare_member(
        &mut self,
        container: SymbolId,
        name: &str,
        declaration: Declaration,
    ) -> SymbolId {
        if let Some(existing) = self.arena[container].member(name) {
            self.arena[existing].declarations.push(declaration);
            return existing;
        }

        let id = self
            .arena
            .alloc_with_id(|id| Symbol::new(id, name, declaration));
        self.arena[id].parent = Some(container);
        self.arena[container]
            .members
            .insert(name.to_string(), id);
        id
    }

    /// Declares a symbol reachable from neither a scope nor a container.
    pub fn declare_detached(&mut self, name: &str, declaration: Declaration) -> SymbolId {
        self.arena
            .alloc_with_id(|id| Symbol::new(id, name, declaration))
    }

    /// Attaches an already declared symbol to a container.
    pub fn adopt(&mut self, container: SymbolId, member: SymbolId) {
        let name = self.arena[member].name.clone();
        self.arena[member].parent = Some(container);
        self.arena[container].members.entry(name).or_insert(member);
    }

    pub fn lookup(&self, name: &str, scope: ScopeId, scope_tree: &ScopeTree) -> Option<SymbolId> {
        scope_tree.ancestors(scope).find_map(|s| {
            self.by_scope
                .get(&s.id)
                .and_then(|symbols| symbols.get(name))
                .copied()
        })
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.arena[id]
    }

    pub fn symbols_in_scope(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.by_scope
            .get(&scope)
            .into_iter()
            .flat_map(|symbols| symbols.values().map(|&id| &self.arena[id]))
    }

    pub fn ids(&self) -> Vec<SymbolId> {
        self.arena.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::scope::{ScopeKind, ScopeTree};
    use swc_common::DUMMY_SP;

    fn decl(kind: SymbolKind) -> Declaration {
        Declaration {
            file: FileId::new(0),
            span: DUMMY_SP,
            kind,
        }
    }

    #[test]
    fn same_name_in_same_scope_merges() {
        let mut scopes = ScopeTree::new();
        let global = scopes.create_scope(ScopeKind::Global, None, DUMMY_SP);
        let mut symbols = SymbolTable::new();

        let interface = symbols.declare("Function", global, decl(SymbolKind::Interface));
        let variable = symbols.declare("Function", global, decl(SymbolKind::Variable));

        assert_eq!(interface, variable);
        let symbol = symbols.get(interface);
        assert_eq!(symbol.kind, SymbolKind::Interface);
        assert!(symbol.has_kind(SymbolKind::Variable));
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn lookup_walks_scope_chain_and_prefers_inner() {
        let mut scopes = ScopeTree::new();
        let global = scopes.create_scope(ScopeKind::Global, None, DUMMY_SP);
        let func = scopes.create_scope(ScopeKind::Function, Some(global), DUMMY_SP);
        let mut symbols = SymbolTable::new();

        let outer = symbols.declare("eval", global, decl(SymbolKind::Function));
        let inner = symbols.declare("eval", func, decl(SymbolKind::Parameter));
        let other = symbols.declare("document", global, decl(SymbolKind::Variable));

        assert_eq!(symbols.lookup("eval", func, &scopes), Some(inner));
        assert_eq!(symbols.lookup("eval", global, &scopes), Some(outer));
        assert_eq!(symbols.lookup("document", func, &scopes), Some(other));
        assert_eq!(symbols.lookup("missing", func, &scopes), None);
    }

    #[test]
    fn members_merge_overloads_and_record_parent() {
        let mut scopes = ScopeTree::new();
        let global = scopes.create_scope(ScopeKind::Global, None, DUMMY_SP);
        let mut symbols = SymbolTable::new();
        let document = symbols.declare("Document", global, decl(SymbolKind::Interface));

        let first = symbols.declare_member(document, "createElement", decl(SymbolKind::Method));
        let second = symbols.declare_member(document, "createElement", decl(SymbolKind::Method));

        assert_eq!(first, second);
        assert_eq!(symbols.get(first).parent, Some(document));
        assert_eq!(symbols.get(first).declarations.len(), 2);
        assert_eq!(symbols.get(document).member("createElement"), Some(first));
        assert!(symbols.get(first).scope.is_none());
    }
}
