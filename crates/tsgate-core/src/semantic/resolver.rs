//! Program-wide type resolution
//!
//! [`ProgramResolver`] binds every file of a [`Program`], links imports and
//! re-exports to their targets and class/interface heritage to base symbols,
//! then answers queries lazily. Type evaluation is depth-limited so alias and
//! initializer cycles terminate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use swc_common::Span;
use swc_ecma_ast::{
    Expr, MemberExpr, TsEntityName, TsFnOrConstructorType, TsKeywordTypeKind, TsLit,
    TsType, TsTypeOperatorOp, TsTypeQueryExpr, TsUnionOrIntersectionType,
};
use tracing::debug;

use super::binder::{BindState, Binder};
use super::scope::{ScopeId, ScopeKind, ScopeTree};
use super::symbols::{AliasTarget, Symbol, SymbolId, SymbolKind, SymbolTable};
use super::types::{INDEX_MEMBER, Shape, Signature, SignatureSource, Type, member_name};
use super::{SpanKey, TypeResolver};
use crate::program::{FileId, Program};
use crate::resolution::strip_ts_extension;

const MAX_DEPTH: usize = 32;
const GLOBAL_OBJECT: &str = "globalThis";

pub struct ProgramResolver {
    program: Arc<Program>,
    scopes: ScopeTree,
    symbols: SymbolTable,
    global: ScopeId,
    module_files: HashMap<ScopeId, FileId>,
    references: HashMap<SpanKey, SymbolId>,
    exports: HashMap<FileId, HashMap<String, SymbolId>>,
    star_exports: HashMap<FileId, Vec<FileId>>,
}

impl std::fmt::Debug for ProgramResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramResolver")
            .field("program", &self.program.id())
            .field("symbols", &self.symbols.len())
            .finish()
    }
}

impl ProgramResolver {
    pub fn new(program: Arc<Program>) -> Self {
        let mut state = BindState::new();
        for file in program.files() {
            if let Some(module) = file.module() {
                Binder::bind(&mut state, file.id(), module);
            }
        }
        state.finish();

        let star_exports = state
            .star_exports
            .iter()
            .map(|(&file, specifiers)| {
                let targets = specifiers
                    .iter()
                    .filter_map(|s| program.resolve_module(file, s))
                    .collect();
                (file, targets)
            })
            .collect();

        let mut resolver = ProgramResolver {
            module_files: state
                .module_scopes
                .iter()
                .map(|(&file, &scope)| (scope, file))
                .collect(),
            program,
            scopes: state.scopes,
            symbols: state.symbols,
            global: state.global,
            references: state.references,
            exports: state.exports,
            star_exports,
        };
        resolver.link_aliases();
        resolver.link_heritage();

        debug!(
            program = resolver.program.id().value(),
            symbols = resolver.symbols.len(),
            references = resolver.references.len(),
            "resolver built"
        );
        resolver
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Symbol declared under `name` in the global scope.
    pub fn global_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.lookup(name, self.global, &self.scopes)
    }

    /// Type denoted by a symbol used in a type position.
    pub fn declared_type(&self, id: SymbolId) -> Type {
        self.declared_type_at(id, 0)
    }

    /// Type of a symbol used as a value.
    pub fn value_type(&self, id: SymbolId) -> Type {
        self.value_type_at(id, 0)
    }

    fn link_aliases(&mut self) {
        let mut links = Vec::new();
        for id in self.symbols.ids() {
            match &self.symbols.get(id).alias {
                Some(AliasTarget::Export { file, specifier, name }) => {
                    let target = self
                        .program
                        .resolve_module(*file, specifier)
                        .and_then(|module| self.export_symbol(module, name, &mut HashSet::new()));
                    links.push((id, target.filter(|&t| t != id), None));
                }
                Some(AliasTarget::Namespace { file, specifier }) => {
                    links.push((id, None, self.program.resolve_module(*file, specifier)));
                }
                None => {}
            }
        }

        for (id, aliased, aliased_module) in links {
            let symbol = self.symbols.get_mut(id);
            symbol.aliased = aliased;
            symbol.aliased_module = aliased_module;
        }
    }

    fn link_heritage(&mut self) {
        let mut links = Vec::new();
        for id in self.symbols.ids() {
            let bases: Vec<SymbolId> = self
                .symbols
                .get(id)
                .heritage
                .iter()
                .filter_map(|key| self.references.get(key))
                .map(|&base| self.dealias(base))
                .filter(|&base| base != id)
                .collect();
            if !bases.is_empty() {
                links.push((id, bases));
            }
        }

        for (id, bases) in links {
            self.symbols.get_mut(id).bases = bases;
        }
    }

    fn dealias(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        let mut visited = HashSet::new();
        while visited.insert(current) {
            match self.symbols.get(current).aliased {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    fn export_symbol(
        &self,
        module: FileId,
        name: &str,
        visited: &mut HashSet<FileId>,
    ) -> Option<SymbolId> {
        if !visited.insert(module) {
            return None;
        }
        if let Some(&id) = self.exports.get(&module).and_then(|e| e.get(name)) {
            return Some(id);
        }
        if name == "default" {
            return None;
        }
        self.star_exports
            .get(&module)?
            .iter()
            .find_map(|&target| self.export_symbol(target, name, visited))
    }

    fn value_type_at(&self, id: SymbolId, depth: usize) -> Type {
        if depth > MAX_DEPTH {
            return Type::Unknown;
        }
        let symbol = self.symbols.get(id);

        if let Some(module) = symbol.aliased_module {
            return Type::Module(module);
        }
        if symbol.is_alias() {
            return symbol
                .aliased
                .map_or(Type::Unknown, |target| self.value_type_at(target, depth + 1));
        }
        if symbol.has_kind(SymbolKind::Class) {
            return Type::Class(id);
        }
        if symbol.has_kind(SymbolKind::Function) || symbol.has_kind(SymbolKind::Method) {
            return Type::Function(self.signatures(&symbol.signatures, depth + 1));
        }
        if let Some(annotation) = &symbol.annotation {
            return self.eval_ts_type(annotation, depth + 1);
        }
        if let Some(initializer) = &symbol.initializer {
            return self.eval_shape(initializer, depth + 1);
        }
        if symbol.has_kind(SymbolKind::Namespace) {
            return Type::Namespace(id);
        }
        Type::Unknown
    }

    fn declared_type_at(&self, id: SymbolId, depth: usize) -> Type {
        if depth > MAX_DEPTH {
            return Type::Unknown;
        }
        let symbol = self.symbols.get(id);

        if let Some(module) = symbol.aliased_module {
            return Type::Module(module);
        }
        if symbol.is_alias() {
            return symbol
                .aliased
                .map_or(Type::Unknown, |target| self.declared_type_at(target, depth + 1));
        }
        if let Some(definition) = &symbol.type_definition {
            return self.eval_ts_type(definition, depth + 1);
        }
        if symbol.has_kind(SymbolKind::Class) || symbol.has_kind(SymbolKind::Interface) {
            return Type::Object(id);
        }
        if symbol.has_kind(SymbolKind::Namespace) {
            return Type::Namespace(id);
        }
        Type::Unknown
    }

    fn signatures(&self, sources: &[SignatureSource], depth: usize) -> Vec<Signature> {
        sources
            .iter()
            .map(|source| Signature {
                params: source
                    .params
                    .iter()
                    .map(|p| p.as_ref().map_or(Type::Any, |t| self.eval_ts_type(t, depth)))
                    .collect(),
                ret: source
                    .ret
                    .as_ref()
                    .map_or(Type::Unknown, |t| self.eval_ts_type(t, depth)),
            })
            .collect()
    }

    fn eval_ts_type(&self, ty: &TsType, depth: usize) -> Type {
        if depth > MAX_DEPTH {
            return Type::Unknown;
        }
        match ty {
            TsType::TsKeywordType(keyword) => match keyword.kind {
                TsKeywordTypeKind::TsAnyKeyword => Type::Any,
                TsKeywordTypeKind::TsStringKeyword => Type::String,
                TsKeywordTypeKind::TsNumberKeyword | TsKeywordTypeKind::TsBigIntKeyword => {
                    Type::Number
                }
                TsKeywordTypeKind::TsBooleanKeyword => Type::Boolean,
                TsKeywordTypeKind::TsVoidKeyword => Type::Void,
                TsKeywordTypeKind::TsUndefinedKeyword => Type::Undefined,
                TsKeywordTypeKind::TsNullKeyword => Type::Null,
                TsKeywordTypeKind::TsNeverKeyword => Type::Never,
                _ => Type::Unknown,
            },
            TsType::TsTypeRef(type_ref) => self
                .entity_symbol(&type_ref.type_name, depth + 1)
                .map_or(Type::Unknown, |id| self.declared_type_at(id, depth + 1)),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                Type::union(
                    union
                        .types
                        .iter()
                        .map(|t| self.eval_ts_type(t, depth + 1))
                        .collect(),
                )
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => Type::intersection(
                intersection
                    .types
                    .iter()
                    .map(|t| self.eval_ts_type(t, depth + 1))
                    .collect(),
            ),
            TsType::TsLitType(lit) => match &lit.lit {
                TsLit::Str(s) => Type::StringLiteral(s.value.to_string()),
                TsLit::Number(_) | TsLit::BigInt(_) => Type::Number,
                TsLit::Bool(_) => Type::Boolean,
                TsLit::Tpl(_) => Type::String,
            },
            TsType::TsParenthesizedType(inner) => self.eval_ts_type(&inner.type_ann, depth + 1),
            TsType::TsOptionalType(inner) => self.eval_ts_type(&inner.type_ann, depth + 1),
            TsType::TsTypeOperator(op) if op.op == TsTypeOperatorOp::ReadOnly => {
                self.eval_ts_type(&op.type_ann, depth + 1)
            }
            TsType::TsFnOrConstructorType(TsFnOrConstructorType::TsFnType(fn_type)) => {
                let source = SignatureSource::of_fn_params(
                    &fn_type.params,
                    Some(&*fn_type.type_ann.type_ann),
                );
                Type::Function(self.signatures(std::slice::from_ref(&source), depth + 1))
            }
            TsType::TsTypeQuery(query) => match &query.expr_name {
                TsTypeQueryExpr::TsEntityName(name) => match self.entity_symbol(name, depth + 1) {
                    Some(id) if self.is_global_object(id) => Type::Global,
                    Some(id) => self.value_type_at(id, depth + 1),
                    None => Type::Unknown,
                },
                TsTypeQueryExpr::Import(_) => Type::Unknown,
            },
            _ => Type::Unknown,
        }
    }

    /// Symbol named by a possibly qualified type name such as `ns.Inner`.
    fn entity_symbol(&self, name: &TsEntityName, depth: usize) -> Option<SymbolId> {
        if depth > MAX_DEPTH {
            return None;
        }
        match name {
            TsEntityName::Ident(ident) => self.references.get(&SpanKey::from(ident.span)).copied(),
            TsEntityName::TsQualifiedName(qualified) => {
                let container = self.entity_symbol(&qualified.left, depth + 1)?;
                let container = match self.value_type_at(container, depth + 1) {
                    Type::Unknown => self.declared_type_at(container, depth + 1),
                    other => other,
                };
                self.member_of_type(&container, qualified.right.sym.as_ref(), depth + 1)
            }
        }
    }

    fn eval_shape(&self, shape: &Shape, depth: usize) -> Type {
        if depth > MAX_DEPTH {
            return Type::Unknown;
        }
        match shape {
            Shape::Known(ty) => ty.clone(),
            Shape::Annotated(ty) => self.eval_ts_type(ty, depth + 1),
            Shape::Ident(key) => self
                .references
                .get(key)
                .map_or(Type::Unknown, |&id| self.value_type_at(id, depth + 1)),
            Shape::Member(object, name) => {
                let object = self.eval_shape(object, depth + 1);
                self.member_of_type(&object, name, depth + 1)
                    .map_or(Type::Unknown, |id| self.value_type_at(id, depth + 1))
            }
            Shape::Index(object) => {
                let object = self.eval_shape(object, depth + 1);
                self.member_of_type(&object, INDEX_MEMBER, depth + 1)
                    .map_or(Type::Unknown, |id| self.value_type_at(id, depth + 1))
            }
            Shape::Call(callee, literal) => {
                let callee = self.eval_shape(callee, depth + 1);
                call_result(&callee, literal.as_deref())
            }
            Shape::New(callee) => match self.eval_shape(callee, depth + 1) {
                Type::Class(id) => Type::Object(id),
                _ => Type::Unknown,
            },
            Shape::Either(shapes) => Type::union(
                shapes
                    .iter()
                    .map(|s| self.eval_shape(s, depth + 1))
                    .collect(),
            ),
            Shape::Unknown => Type::Unknown,
        }
    }

    fn member_of_type(&self, ty: &Type, name: &str, depth: usize) -> Option<SymbolId> {
        if depth > MAX_DEPTH {
            return None;
        }
        match ty {
            Type::Object(id) | Type::Class(id) => self.find_member(*id, name, &mut HashSet::new()),
            Type::Namespace(id) => self.symbols.get(*id).member(name),
            Type::Module(file) => self.export_symbol(*file, name, &mut HashSet::new()),
            Type::Global => self.symbols.lookup(name, self.global, &self.scopes),
            Type::Union(types) | Type::Intersection(types) => types
                .iter()
                .find_map(|t| self.member_of_type(t, name, depth + 1)),
            _ => None,
        }
    }

    /// The bundled `globalThis` declaration, unless a user declaration
    /// shadows it.
    fn is_global_object(&self, id: SymbolId) -> bool {
        let symbol = self.symbols.get(id);
        symbol.name == GLOBAL_OBJECT
            && symbol.scope == Some(self.global)
            && symbol
                .declarations
                .iter()
                .all(|d| self.program.file(d.file).is_default_lib())
    }

    fn find_member(
        &self,
        id: SymbolId,
        name: &str,
        visited: &mut HashSet<SymbolId>,
    ) -> Option<SymbolId> {
        if !visited.insert(id) {
            return None;
        }
        let symbol = self.symbols.get(id);
        symbol.member(name).or_else(|| {
            symbol
                .bases
                .iter()
                .find_map(|&base| self.find_member(base, name, visited))
        })
    }

    fn module_of_scope(&self, scope: ScopeId) -> Option<FileId> {
        match self.scopes.get(scope).kind {
            ScopeKind::Module => self.module_files.get(&scope).copied(),
            _ => None,
        }
    }
}

/// Return type of calling `callee`, picking the overload whose string-literal
/// first parameter matches the literal argument.
fn call_result(callee: &Type, literal: Option<&str>) -> Type {
    let Type::Function(signatures) = callee else {
        return Type::Unknown;
    };

    signatures
        .iter()
        .find(|signature| match signature.params.first() {
            Some(Type::StringLiteral(expected)) => Some(expected.as_str()) == literal,
            _ => true,
        })
        .or_else(|| signatures.first())
        .map_or(Type::Unknown, |signature| signature.ret.clone())
}

impl TypeResolver for ProgramResolver {
    fn symbol_at(&self, span: Span) -> Option<SymbolId> {
        self.references.get(&SpanKey::from(span)).copied()
    }

    fn property_symbol(&self, member: &MemberExpr) -> Option<SymbolId> {
        let name = member_name(&member.prop)?;
        let object = self.type_of_expr(&member.obj);
        self.member_of_type(&object, &name, 0)
    }

    fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }

    fn aliased_symbol(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbols.get(id).aliased
    }

    fn fully_qualified_name(&self, id: SymbolId) -> String {
        let mut names = Vec::new();
        let mut top = id;
        let mut current = Some(id);
        while let Some(symbol_id) = current {
            if names.len() > MAX_DEPTH {
                break;
            }
            let symbol = self.symbols.get(symbol_id);
            names.push(symbol.name.as_str());
            top = symbol_id;
            current = symbol.parent;
        }
        names.reverse();
        let dotted = names.join(".");

        let module = self
            .symbols
            .get(top)
            .scope
            .and_then(|scope| self.module_of_scope(scope));
        match module {
            Some(file) => {
                let path = strip_ts_extension(self.program.file(file).path());
                format!("\"{path}\".{dotted}")
            }
            None => dotted,
        }
    }

    fn type_of_expr(&self, expr: &Expr) -> Type {
        self.eval_shape(&Shape::of(expr), 0)
    }

    fn base_types(&self, id: SymbolId) -> &[SymbolId] {
        self.symbols.get(id).bases()
    }

    fn resolve_module(&self, importer: FileId, specifier: &str) -> Option<FileId> {
        self.program.resolve_module(importer, specifier)
    }

    fn file_path(&self, file: FileId) -> &str {
        self.program.file(file).path()
    }

    fn is_default_lib(&self, file: FileId) -> bool {
        self.program.file(file).is_default_lib()
    }
}
