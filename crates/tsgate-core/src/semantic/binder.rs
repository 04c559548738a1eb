//! Binder: builds the scope tree and symbol table from every file of a program
//!
//! Binding happens in one pass per file. Identifier references are recorded
//! as pending and resolved only after every file has been bound, so hoisted
//! functions, merged declarations and cross-file globals all resolve.

use std::collections::HashMap;

use swc_common::Span;
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, CatchClause, Class, ClassDecl, ClassExpr, ClassMember, Constructor,
    DefaultDecl, ExportAll, ExportDecl, ExportDefaultDecl, ExportDefaultExpr,
    ExportSpecifier, Expr, FnDecl, ForInStmt, ForOfStmt, ForStmt, Function, Ident, ImportDecl,
    ImportSpecifier, Lit, MethodKind, Module, ModuleExportName, ModuleItem,
    NamedExport, ObjectPatProp, ParamOrTsParamProp, Pat, Prop, PropName, SimpleAssignTarget,
    TsEntityName, TsEnumDecl, TsFnParam, TsIndexSignature, TsInterfaceDecl, TsKeywordTypeKind,
    TsModuleDecl, TsModuleName, TsNamespaceBody, TsParamPropParam, TsType, TsTypeAliasDecl,
    TsTypeElement, TsTypeQuery, TsTypeQueryExpr, TsTypeRef, VarDecl, VarDeclKind,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::SpanKey;
use super::scope::{ScopeId, ScopeKind, ScopeTree};
use super::symbols::{AliasTarget, Declaration, SymbolId, SymbolKind, SymbolTable};
use super::types::{INDEX_MEMBER, Shape, SignatureSource, pat_annotation};
use crate::program::FileId;

/// An identifier use waiting for name lookup.
pub(crate) struct PendingReference {
    pub key: SpanKey,
    pub name: String,
    pub scope: ScopeId,
}

/// `export { local as exported }` without a source module.
pub(crate) struct PendingExport {
    pub file: FileId,
    pub scope: ScopeId,
    pub local: String,
    pub exported: String,
}

pub(crate) struct BindState {
    pub scopes: ScopeTree,
    pub symbols: SymbolTable,
    pub global: ScopeId,
    pub module_scopes: HashMap<FileId, ScopeId>,
    pub references: HashMap<SpanKey, SymbolId>,
    pub pending: Vec<PendingReference>,
    pub exports: HashMap<FileId, HashMap<String, SymbolId>>,
    pub star_exports: HashMap<FileId, Vec<String>>,
    pub pending_exports: Vec<PendingExport>,
}

impl BindState {
    pub fn new() -> Self {
        let mut scopes = ScopeTree::new();
        let global = scopes.create_scope(ScopeKind::Global, None, Span::default());
        Self {
            scopes,
            symbols: SymbolTable::new(),
            global,
            module_scopes: HashMap::new(),
            references: HashMap::new(),
            pending: Vec::new(),
            exports: HashMap::new(),
            star_exports: HashMap::new(),
            pending_exports: Vec::new(),
        }
    }

    /// Resolves pending references and local exports by name lookup.
    pub fn finish(&mut self) {
        for reference in std::mem::take(&mut self.pending) {
            if self.references.contains_key(&reference.key) {
                continue;
            }
            if let Some(id) = self
                .symbols
                .lookup(&reference.name, reference.scope, &self.scopes)
            {
                self.references.insert(reference.key, id);
            }
        }

        for export in std::mem::take(&mut self.pending_exports) {
            if let Some(id) = self.symbols.lookup(&export.local, export.scope, &self.scopes) {
                self.exports
                    .entry(export.file)
                    .or_default()
                    .insert(export.exported, id);
            }
        }
    }
}

pub(crate) struct Binder<'s> {
    state: &'s mut BindState,
    file: FileId,
    scope: ScopeId,
    module_scope: Option<ScopeId>,
    /// Namespace whose top-level declarations become its members.
    container: Option<(SymbolId, ScopeId)>,
    exporting: bool,
}

impl<'s> Binder<'s> {
    pub fn bind(state: &'s mut BindState, file: FileId, module: &Module) {
        let global = state.global;
        let mut binder = Binder {
            state,
            file,
            scope: global,
            module_scope: None,
            container: None,
            exporting: false,
        };
        module.visit_with(&mut binder);
    }

    fn with_scope(&mut self, kind: ScopeKind, span: Span, f: impl FnOnce(&mut Self)) {
        let scope = self.state.scopes.create_scope(kind, Some(self.scope), span);
        let previous = std::mem::replace(&mut self.scope, scope);
        f(self);
        self.scope = previous;
    }

    fn declare_in(&mut self, scope: ScopeId, ident: &Ident, kind: SymbolKind) -> SymbolId {
        let declaration = Declaration {
            file: self.file,
            span: ident.span,
            kind,
        };
        let id = self.state.symbols.declare(ident.sym.as_ref(), scope, declaration);
        self.state.references.insert(SpanKey::from(ident.span), id);

        if let Some((container, container_scope)) = self.container {
            if container_scope == scope && container != id {
                self.state.symbols.adopt(container, id);
            }
        }
        if self.exporting && Some(scope) == self.module_scope {
            self.export(ident.sym.to_string(), id);
        }
        id
    }

    fn declare(&mut self, ident: &Ident, kind: SymbolKind) -> SymbolId {
        self.declare_in(self.scope, ident, kind)
    }

    fn declare_member(
        &mut self,
        container: SymbolId,
        name: &str,
        span: Span,
        kind: SymbolKind,
    ) -> SymbolId {
        let declaration = Declaration {
            file: self.file,
            span,
            kind,
        };
        self.state.symbols.declare_member(container, name, declaration)
    }

    fn export(&mut self, name: String, id: SymbolId) {
        self.state
            .exports
            .entry(self.file)
            .or_default()
            .insert(name, id);
    }

    fn reference(&mut self, ident: &Ident) {
        self.state.pending.push(PendingReference {
            key: SpanKey::from(ident.span),
            name: ident.sym.to_string(),
            scope: self.scope,
        });
    }

    fn hoisting_scope(&self) -> ScopeId {
        self.state
            .scopes
            .ancestors(self.scope)
            .find(|s| {
                matches!(
                    s.kind,
                    ScopeKind::Global | ScopeKind::Module | ScopeKind::Namespace | ScopeKind::Function
                )
            })
            .map(|s| s.id)
            .unwrap_or(self.scope)
    }

    fn declare_params<'p>(&mut self, params: impl Iterator<Item = &'p Pat>) {
        for pat in params {
            let annotation = pat_annotation(pat);
            for ident in binding_idents(pat) {
                let id = self.declare(ident, SymbolKind::Parameter);
                if let Pat::Ident(_) | Pat::Assign(_) = pat {
                    self.state.symbols.get_mut(id).annotation = annotation.clone();
                }
            }
            pat.visit_with(self);
        }
    }

    fn bind_function(&mut self, function: &Function) {
        self.with_scope(ScopeKind::Function, function.span, |binder| {
            binder.declare_params(function.params.iter().map(|p| &p.pat));
            function.decorators.visit_with(binder);
            function.return_type.visit_with(binder);
            if let Some(body) = &function.body {
                body.stmts.visit_with(binder);
            }
        });
    }

    fn bind_class(&mut self, symbol: Option<SymbolId>, class: &Class) {
        if let Some(id) = symbol {
            if let Some(Expr::Ident(base)) = class.super_class.as_deref() {
                self.state
                    .symbols
                    .get_mut(id)
                    .heritage
                    .push(SpanKey::from(base.span));
            }
            for member in &class.body {
                self.bind_class_member(id, member);
            }
        }

        self.with_scope(ScopeKind::Class, class.span, |binder| {
            class.visit_children_with(binder);
        });
    }

    fn bind_class_member(&mut self, class: SymbolId, member: &ClassMember) {
        match member {
            ClassMember::Method(method) => {
                let Some(name) = prop_name(&method.key) else {
                    return;
                };
                match method.kind {
                    MethodKind::Method => {
                        let id = self.declare_member(class, &name, method.span, SymbolKind::Method);
                        self.state
                            .symbols
                            .get_mut(id)
                            .signatures
                            .push(SignatureSource::of_function(&method.function));
                    }
                    MethodKind::Getter => {
                        let id = self.declare_member(class, &name, method.span, SymbolKind::Property);
                        let symbol = self.state.symbols.get_mut(id);
                        if symbol.annotation.is_none() {
                            symbol.annotation =
                                method.function.return_type.as_ref().map(|t| t.type_ann.clone());
                        }
                    }
                    MethodKind::Setter => {
                        let id = self.declare_member(class, &name, method.span, SymbolKind::Property);
                        let symbol = self.state.symbols.get_mut(id);
                        if symbol.annotation.is_none() {
                            symbol.annotation = method
                                .function
                                .params
                                .first()
                                .and_then(|p| pat_annotation(&p.pat));
                        }
                    }
                }
            }
            ClassMember::ClassProp(prop) => {
                let Some(name) = prop_name(&prop.key) else {
                    return;
                };
                let id = self.declare_member(class, &name, prop.span, SymbolKind::Property);
                let symbol = self.state.symbols.get_mut(id);
                symbol.annotation = prop.type_ann.as_ref().map(|t| t.type_ann.clone());
                if symbol.annotation.is_none() {
                    symbol.initializer = prop.value.as_deref().map(Shape::of);
                }
            }
            ClassMember::Constructor(ctor) => {
                for param in &ctor.params {
                    let ParamOrTsParamProp::TsParamProp(prop) = param else {
                        continue;
                    };
                    let binding = match &prop.param {
                        TsParamPropParam::Ident(ident) => ident,
                        TsParamPropParam::Assign(assign) => match &*assign.left {
                            Pat::Ident(ident) => ident,
                            _ => continue,
                        },
                    };
                    let id = self.declare_member(
                        class,
                        binding.id.sym.as_ref(),
                        binding.id.span,
                        SymbolKind::Property,
                    );
                    self.state.symbols.get_mut(id).annotation =
                        binding.type_ann.as_ref().map(|t| t.type_ann.clone());
                }
            }
            _ => {}
        }
    }

    fn bind_interface(&mut self, decl: &TsInterfaceDecl) -> SymbolId {
        let id = self.declare(&decl.id, SymbolKind::Interface);

        for heritage in &decl.extends {
            if let Expr::Ident(base) = &*heritage.expr {
                self.state
                    .symbols
                    .get_mut(id)
                    .heritage
                    .push(SpanKey::from(base.span));
            }
        }

        for element in &decl.body.body {
            match element {
                TsTypeElement::TsPropertySignature(prop) => {
                    let Some(name) = signature_key(&prop.key, prop.computed) else {
                        continue;
                    };
                    let member = self.declare_member(id, &name, prop.span, SymbolKind::Property);
                    self.state.symbols.get_mut(member).annotation =
                        prop.type_ann.as_ref().map(|t| t.type_ann.clone());
                }
                TsTypeElement::TsGetterSignature(getter) => {
                    let Some(name) = signature_key(&getter.key, getter.computed) else {
                        continue;
                    };
                    let member = self.declare_member(id, &name, getter.span, SymbolKind::Property);
                    self.state.symbols.get_mut(member).annotation =
                        getter.type_ann.as_ref().map(|t| t.type_ann.clone());
                }
                TsTypeElement::TsMethodSignature(method) => {
                    let Some(name) = signature_key(&method.key, method.computed) else {
                        continue;
                    };
                    let member = self.declare_member(id, &name, method.span, SymbolKind::Method);
                    self.state.symbols.get_mut(member).signatures.push(
                        SignatureSource::of_fn_params(
                            &method.params,
                            method.type_ann.as_deref().map(|t| &*t.type_ann),
                        ),
                    );
                }
                TsTypeElement::TsIndexSignature(index) if is_numeric_index(index) => {
                    let member =
                        self.declare_member(id, INDEX_MEMBER, index.span, SymbolKind::Property);
                    self.state.symbols.get_mut(member).annotation =
                        index.type_ann.as_ref().map(|t| t.type_ann.clone());
                }
                _ => {}
            }
        }

        decl.visit_children_with(self);
        id
    }

    fn bind_namespace(&mut self, ident: &Ident, body: Option<&TsNamespaceBody>, span: Span) {
        let id = self.declare(ident, SymbolKind::Namespace);

        let scope = self.state.scopes.create_scope(ScopeKind::Namespace, Some(self.scope), span);
        let previous_scope = std::mem::replace(&mut self.scope, scope);
        let previous_container = self.container.replace((id, scope));
        let previous_exporting = std::mem::replace(&mut self.exporting, false);

        match body {
            Some(TsNamespaceBody::TsModuleBlock(block)) => block.body.visit_with(self),
            Some(TsNamespaceBody::TsNamespaceDecl(nested)) => {
                self.bind_namespace(&nested.id, Some(&nested.body), nested.span)
            }
            None => {}
        }

        self.exporting = previous_exporting;
        self.container = previous_container;
        self.scope = previous_scope;
    }

    fn import_alias(&mut self, local: &Ident, alias: AliasTarget) {
        let id = self.declare(local, SymbolKind::Import);
        self.state.symbols.get_mut(id).alias = Some(alias);
    }
}

impl Visit for Binder<'_> {
    fn visit_module(&mut self, module: &Module) {
        let is_module = module
            .body
            .iter()
            .any(|item| matches!(item, ModuleItem::ModuleDecl(_)));

        if is_module {
            let scope = self
                .state
                .scopes
                .create_scope(ScopeKind::Module, Some(self.state.global), module.span);
            self.state.module_scopes.insert(self.file, scope);
            self.module_scope = Some(scope);
            self.scope = scope;
        }

        module.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, import: &ImportDecl) {
        let specifier = import.src.value.to_string();
        for spec in &import.specifiers {
            match spec {
                ImportSpecifier::Named(named) => {
                    let name = named
                        .imported
                        .as_ref()
                        .map(|imported| imported.atom().to_string())
                        .unwrap_or_else(|| named.local.sym.to_string());
                    self.import_alias(
                        &named.local,
                        AliasTarget::Export {
                            file: self.file,
                            specifier: specifier.clone(),
                            name,
                        },
                    );
                }
                ImportSpecifier::Default(default) => self.import_alias(
                    &default.local,
                    AliasTarget::Export {
                        file: self.file,
                        specifier: specifier.clone(),
                        name: "default".to_string(),
                    },
                ),
                ImportSpecifier::Namespace(namespace) => self.import_alias(
                    &namespace.local,
                    AliasTarget::Namespace {
                        file: self.file,
                        specifier: specifier.clone(),
                    },
                ),
            }
        }
    }

    fn visit_export_decl(&mut self, export: &ExportDecl) {
        let previous = std::mem::replace(&mut self.exporting, true);
        export.decl.visit_with(self);
        self.exporting = previous;
    }

    fn visit_export_default_decl(&mut self, export: &ExportDefaultDecl) {
        match &export.decl {
            DefaultDecl::Fn(fn_expr) => {
                if let Some(ident) = &fn_expr.ident {
                    let id = self.declare(ident, SymbolKind::Function);
                    self.state
                        .symbols
                        .get_mut(id)
                        .signatures
                        .push(SignatureSource::of_function(&fn_expr.function));
                    self.export("default".to_string(), id);
                }
                self.bind_function(&fn_expr.function);
            }
            DefaultDecl::Class(class_expr) => {
                let id = class_expr
                    .ident
                    .as_ref()
                    .map(|ident| self.declare(ident, SymbolKind::Class));
                if let Some(id) = id {
                    self.export("default".to_string(), id);
                }
                self.bind_class(id, &class_expr.class);
            }
            DefaultDecl::TsInterfaceDecl(decl) => {
                let id = self.bind_interface(decl);
                self.export("default".to_string(), id);
            }
        }
    }

    fn visit_export_default_expr(&mut self, export: &ExportDefaultExpr) {
        let declaration = Declaration {
            file: self.file,
            span: export.span,
            kind: SymbolKind::Variable,
        };
        let id = self.state.symbols.declare_detached("default", declaration);
        self.state.symbols.get_mut(id).initializer = Some(Shape::of(&export.expr));
        self.export("default".to_string(), id);
        export.expr.visit_with(self);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        let Some(src) = &export.src else {
            for spec in &export.specifiers {
                if let ExportSpecifier::Named(named) = spec {
                    let ModuleExportName::Ident(orig) = &named.orig else {
                        continue;
                    };
                    self.reference(orig);
                    let exported = named
                        .exported
                        .as_ref()
                        .map(|e| e.atom().to_string())
                        .unwrap_or_else(|| orig.sym.to_string());
                    self.state.pending_exports.push(PendingExport {
                        file: self.file,
                        scope: self.scope,
                        local: orig.sym.to_string(),
                        exported,
                    });
                }
            }
            return;
        };

        let specifier = src.value.to_string();
        for spec in &export.specifiers {
            let (exported, alias, span) = match spec {
                ExportSpecifier::Named(named) => {
                    let orig = named.orig.atom().to_string();
                    let exported = named
                        .exported
                        .as_ref()
                        .map(|e| e.atom().to_string())
                        .unwrap_or_else(|| orig.clone());
                    (
                        exported,
                        AliasTarget::Export {
                            file: self.file,
                            specifier: specifier.clone(),
                            name: orig,
                        },
                        named.span,
                    )
                }
                ExportSpecifier::Namespace(namespace) => (
                    namespace.name.atom().to_string(),
                    AliasTarget::Namespace {
                        file: self.file,
                        specifier: specifier.clone(),
                    },
                    namespace.span,
                ),
                ExportSpecifier::Default(default) => (
                    default.exported.sym.to_string(),
                    AliasTarget::Export {
                        file: self.file,
                        specifier: specifier.clone(),
                        name: "default".to_string(),
                    },
                    default.exported.span,
                ),
            };
            let declaration = Declaration {
                file: self.file,
                span,
                kind: SymbolKind::Import,
            };
            let id = self.state.symbols.declare_detached(&exported, declaration);
            self.state.symbols.get_mut(id).alias = Some(alias);
            self.export(exported, id);
        }
    }

    fn visit_export_all(&mut self, export: &ExportAll) {
        self.state
            .star_exports
            .entry(self.file)
            .or_default()
            .push(export.src.value.to_string());
    }

    fn visit_var_decl(&mut self, var: &VarDecl) {
        let scope = if var.kind == VarDeclKind::Var {
            self.hoisting_scope()
        } else {
            self.scope
        };

        for declarator in &var.decls {
            let annotation = pat_annotation(&declarator.name);
            for ident in binding_idents(&declarator.name) {
                let id = self.declare_in(scope, ident, SymbolKind::Variable);
                if let Pat::Ident(_) = &declarator.name {
                    let symbol = self.state.symbols.get_mut(id);
                    symbol.annotation = annotation.clone();
                    if symbol.annotation.is_none() {
                        symbol.initializer = declarator.init.as_deref().map(Shape::of);
                    }
                }
            }
            declarator.name.visit_with(self);
            declarator.init.visit_with(self);
        }
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        let id = self.declare(&decl.ident, SymbolKind::Function);
        self.state
            .symbols
            .get_mut(id)
            .signatures
            .push(SignatureSource::of_function(&decl.function));
        self.bind_function(&decl.function);
    }

    fn visit_function(&mut self, function: &Function) {
        self.bind_function(function);
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.with_scope(ScopeKind::Function, arrow.span, |binder| {
            binder.declare_params(arrow.params.iter());
            arrow.return_type.visit_with(binder);
            arrow.body.visit_with(binder);
        });
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        self.with_scope(ScopeKind::Function, ctor.span, |binder| {
            for param in &ctor.params {
                match param {
                    ParamOrTsParamProp::Param(param) => {
                        binder.declare_params(std::iter::once(&param.pat));
                    }
                    ParamOrTsParamProp::TsParamProp(prop) => {
                        let ident = match &prop.param {
                            TsParamPropParam::Ident(ident) => Some(&ident.id),
                            TsParamPropParam::Assign(assign) => match &*assign.left {
                                Pat::Ident(ident) => Some(&ident.id),
                                _ => None,
                            },
                        };
                        if let Some(ident) = ident {
                            binder.declare(ident, SymbolKind::Parameter);
                        }
                        prop.param.visit_with(binder);
                    }
                }
            }
            if let Some(body) = &ctor.body {
                body.stmts.visit_with(binder);
            }
        });
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        let id = self.declare(&decl.ident, SymbolKind::Class);
        self.bind_class(Some(id), &decl.class);
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        self.bind_class(None, &expr.class);
    }

    fn visit_ts_interface_decl(&mut self, decl: &TsInterfaceDecl) {
        self.bind_interface(decl);
    }

    fn visit_ts_type_alias_decl(&mut self, decl: &TsTypeAliasDecl) {
        let id = self.declare(&decl.id, SymbolKind::TypeAlias);
        self.state.symbols.get_mut(id).type_definition = Some(decl.type_ann.clone());
        decl.type_ann.visit_with(self);
    }

    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        self.declare(&decl.id, SymbolKind::Variable);
        decl.members.visit_with(self);
    }

    fn visit_ts_module_decl(&mut self, decl: &TsModuleDecl) {
        if decl.global {
            let global = self.state.global;
            let previous_scope = std::mem::replace(&mut self.scope, global);
            let previous_container = self.container.take();
            let previous_exporting = std::mem::replace(&mut self.exporting, false);
            decl.body.visit_with(self);
            self.exporting = previous_exporting;
            self.container = previous_container;
            self.scope = previous_scope;
            return;
        }

        match &decl.id {
            TsModuleName::Ident(ident) => self.bind_namespace(ident, decl.body.as_ref(), decl.span),
            TsModuleName::Str(_) => {
                let previous_exporting = std::mem::replace(&mut self.exporting, false);
                self.with_scope(ScopeKind::Module, decl.span, |binder| {
                    decl.body.visit_with(binder);
                });
                self.exporting = previous_exporting;
            }
        }
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.with_scope(ScopeKind::Block, block.span, |binder| {
            block.stmts.visit_with(binder);
        });
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.with_scope(ScopeKind::Block, stmt.span, |binder| {
            stmt.visit_children_with(binder);
        });
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.with_scope(ScopeKind::Block, stmt.span, |binder| {
            stmt.visit_children_with(binder);
        });
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.with_scope(ScopeKind::Block, stmt.span, |binder| {
            stmt.visit_children_with(binder);
        });
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.with_scope(ScopeKind::Block, clause.span, |binder| {
            if let Some(param) = &clause.param {
                for ident in binding_idents(param) {
                    binder.declare(ident, SymbolKind::Variable);
                }
                param.visit_with(binder);
            }
            clause.body.stmts.visit_with(binder);
        });
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Ident(ident) = expr {
            self.reference(ident);
            return;
        }
        expr.visit_children_with(self);
    }

    fn visit_prop(&mut self, prop: &Prop) {
        if let Prop::Shorthand(ident) = prop {
            self.reference(ident);
            return;
        }
        prop.visit_children_with(self);
    }

    fn visit_simple_assign_target(&mut self, target: &SimpleAssignTarget) {
        if let SimpleAssignTarget::Ident(binding) = target {
            self.reference(&binding.id);
            return;
        }
        target.visit_children_with(self);
    }

    fn visit_ts_type_ref(&mut self, type_ref: &TsTypeRef) {
        self.reference(leftmost(&type_ref.type_name));
        type_ref.type_params.visit_with(self);
    }

    fn visit_ts_type_query(&mut self, query: &TsTypeQuery) {
        if let TsTypeQueryExpr::TsEntityName(name) = &query.expr_name {
            self.reference(leftmost(name));
        }
        query.type_args.visit_with(self);
    }
}

/// `[index: number]: T`
fn is_numeric_index(index: &TsIndexSignature) -> bool {
    match index.params.as_slice() {
        [TsFnParam::Ident(param)] => param.type_ann.as_ref().is_some_and(|t| {
            matches!(
                &*t.type_ann,
                TsType::TsKeywordType(keyword) if keyword.kind == TsKeywordTypeKind::TsNumberKeyword
            )
        }),
        _ => false,
    }
}

fn leftmost(name: &TsEntityName) -> &Ident {
    match name {
        TsEntityName::Ident(ident) => ident,
        TsEntityName::TsQualifiedName(qualified) => leftmost(&qualified.left),
    }
}

/// Identifiers bound by a pattern.
pub(crate) fn binding_idents(pat: &Pat) -> Vec<&Ident> {
    let mut idents = Vec::new();
    collect_binding_idents(pat, &mut idents);
    idents
}

fn collect_binding_idents<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_binding_idents(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_binding_idents(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
                    ObjectPatProp::Rest(rest) => collect_binding_idents(&rest.arg, out),
                }
            }
        }
        Pat::Rest(rest) => collect_binding_idents(&rest.arg, out),
        Pat::Assign(assign) => collect_binding_idents(&assign.left, out),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        PropName::Computed(_) | PropName::BigInt(_) => None,
    }
}

fn signature_key(key: &Expr, computed: bool) -> Option<String> {
    match key {
        Expr::Ident(ident) if !computed => Some(ident.sym.to_string()),
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        _ => None,
    }
}
