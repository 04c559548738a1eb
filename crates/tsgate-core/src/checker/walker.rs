//! The single traversal behind [`Checker::execute`](super::Checker::execute).

use swc_ecma_ast::{
    AssignExpr, AssignOp, AssignTarget, BinExpr, BinaryOp, CallExpr, Callee, Expr, ExportSpecifier,
    Ident, ImportDecl, ImportSpecifier, MemberExpr, MemberProp, ModuleExportName, NamedExport,
    NewExpr, OptChainBase, OptChainExpr, Prop, SimpleAssignTarget, TsExprWithTypeArgs,
    TsInterfaceDecl, TsType, TsTypeAliasDecl, TsTypeAnn, TsTypeParamDecl,
    TsTypeParamInstantiation, UnaryExpr, UnaryOp,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::trace;

use super::context::{FailureSink, RuleContext};
use super::node::{NameOccurrence, NameSite, Node, PropertyOccurrence, Usage};
use super::{Checker, RuleScope};
use crate::program::SourceFile;
use crate::semantic::types::string_literal;

pub(crate) struct Walker<'c> {
    checker: &'c Checker,
    file: &'c SourceFile,
    sink: FailureSink,
}

impl<'c> Walker<'c> {
    pub fn new(checker: &'c Checker, file: &'c SourceFile, sink: FailureSink) -> Self {
        Self {
            checker,
            file,
            sink,
        }
    }

    pub fn finish(self) -> FailureSink {
        self.sink
    }

    fn context<'s>(&'s mut self, scope: &'s RuleScope) -> RuleContext<'s> {
        let checker = self.checker;
        RuleContext::new(
            checker.resolver.as_ref(),
            self.file,
            scope,
            &checker.trusted_types,
            &mut self.sink,
        )
    }

    fn dispatch_node(&mut self, node: Node<'_>) {
        let checker = self.checker;
        let Some(handlers) = checker.node_handlers.get(&node.kind()) else {
            return;
        };
        for registered in handlers {
            let mut ctx = self.context(&registered.scope);
            (registered.handler)(&mut ctx, node);
        }
    }

    fn dispatch_name(&mut self, occurrence: NameOccurrence<'_>) {
        let checker = self.checker;
        let Some(handlers) = checker.name_handlers.get(&occurrence.name) else {
            return;
        };
        trace!(name = %occurrence.name, handlers = handlers.len(), "name occurrence");
        for registered in handlers {
            let mut ctx = self.context(&registered.scope);
            (registered.handler)(&mut ctx, &occurrence);
        }
    }

    fn dispatch_property(&mut self, occurrence: PropertyOccurrence<'_>) {
        let checker = self.checker;
        let handlers = if occurrence.computed {
            &checker.element_handlers
        } else {
            &checker.property_handlers
        };
        let Some(handlers) = handlers.get(&occurrence.name) else {
            return;
        };
        trace!(property = %occurrence.name, handlers = handlers.len(), "property occurrence");
        for registered in handlers {
            let mut ctx = self.context(&registered.scope);
            (registered.handler)(&mut ctx, &occurrence);
        }
    }

    fn reference<'n>(&mut self, ident: &'n Ident, usage: Usage<'n>) {
        self.dispatch_name(NameOccurrence {
            name: ident.sym.to_string(),
            site: NameSite::Reference(ident),
            span: ident.span,
            usage,
        });
    }

    fn member<'n>(&mut self, member: &'n MemberExpr, usage: Usage<'n>) {
        self.dispatch_node(Node::Member(member));

        match &member.prop {
            MemberProp::Ident(name) => {
                let name = name.sym.to_string();
                self.dispatch_name(NameOccurrence {
                    name: name.clone(),
                    site: NameSite::Property(member),
                    span: member.span,
                    usage,
                });
                self.dispatch_property(PropertyOccurrence {
                    name,
                    member,
                    computed: false,
                    usage,
                });
            }
            MemberProp::Computed(computed) => {
                if let Some(key) = string_literal(&computed.expr) {
                    self.dispatch_property(PropertyOccurrence {
                        name: key,
                        member,
                        computed: true,
                        usage,
                    });
                }
            }
            MemberProp::PrivateName(_) => {}
        }

        member.obj.visit_with(self);
        if let MemberProp::Computed(computed) = &member.prop {
            computed.expr.visit_with(self);
        }
    }

    /// Visits an expression whose value is used as `usage` by its parent,
    /// looking through parentheses and non-null assertions.
    fn used<'n>(&mut self, expr: &'n Expr, usage: Usage<'n>) {
        match expr {
            Expr::Paren(paren) => self.used(&paren.expr, usage),
            Expr::TsNonNull(inner) => self.used(&inner.expr, usage),
            Expr::Ident(ident) => self.reference(ident, usage),
            Expr::Member(member) => self.member(member, usage),
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(member) => self.member(member, usage),
                OptChainBase::Call(_) => chain.visit_with(self),
            },
            _ => expr.visit_with(self),
        }
    }

    /// Operand of `typeof` or `instanceof`: the tested name itself is not a
    /// use, but anything it is computed from is.
    fn type_test_operand(&mut self, expr: &Expr) {
        match expr {
            Expr::Paren(paren) => self.type_test_operand(&paren.expr),
            Expr::Ident(_) => {}
            Expr::Member(member) => {
                member.obj.visit_with(self);
                if let MemberProp::Computed(computed) = &member.prop {
                    computed.expr.visit_with(self);
                }
            }
            _ => expr.visit_with(self),
        }
    }
}

impl Visit for Walker<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.reference(ident, Usage::Read),
            Expr::Member(member) => self.member(member, Usage::Read),
            _ => expr.visit_children_with(self),
        }
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        self.dispatch_node(Node::Call(call));
        match &call.callee {
            Callee::Expr(callee) => self.used(callee, Usage::Call(&call.args)),
            other => other.visit_with(self),
        }
        call.args.visit_with(self);
    }

    fn visit_new_expr(&mut self, new: &NewExpr) {
        self.dispatch_node(Node::New(new));
        let args = new.args.as_deref().unwrap_or(&[]);
        self.used(&new.callee, Usage::New(args));
        new.args.visit_with(self);
    }

    fn visit_opt_chain_expr(&mut self, chain: &OptChainExpr) {
        match &*chain.base {
            OptChainBase::Member(member) => self.member(member, Usage::Read),
            OptChainBase::Call(call) => {
                self.used(&call.callee, Usage::Call(&call.args));
                call.args.visit_with(self);
            }
        }
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        self.dispatch_node(Node::Assign(assign));
        let usage = Usage::Write {
            value: &assign.right,
            compound: assign.op != AssignOp::Assign,
        };
        match &assign.left {
            AssignTarget::Simple(SimpleAssignTarget::Member(member)) => self.member(member, usage),
            AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
                self.reference(&binding.id, usage)
            }
            AssignTarget::Simple(SimpleAssignTarget::Paren(paren)) => self.used(&paren.expr, usage),
            other => other.visit_with(self),
        }
        assign.right.visit_with(self);
    }

    fn visit_unary_expr(&mut self, unary: &UnaryExpr) {
        if unary.op == UnaryOp::TypeOf {
            self.type_test_operand(&unary.arg);
        } else {
            unary.visit_children_with(self);
        }
    }

    fn visit_bin_expr(&mut self, bin: &BinExpr) {
        if bin.op == BinaryOp::InstanceOf {
            self.type_test_operand(&bin.left);
            self.type_test_operand(&bin.right);
        } else {
            bin.visit_children_with(self);
        }
    }

    fn visit_prop(&mut self, prop: &Prop) {
        match prop {
            Prop::Shorthand(ident) => self.reference(ident, Usage::Read),
            _ => prop.visit_children_with(self),
        }
    }

    fn visit_import_decl(&mut self, import: &ImportDecl) {
        self.dispatch_node(Node::Import(import));
        if import.type_only {
            return;
        }

        for specifier in &import.specifiers {
            let ImportSpecifier::Named(named) = specifier else {
                continue;
            };
            if named.is_type_only {
                continue;
            }
            let name = match &named.imported {
                Some(ModuleExportName::Ident(imported)) => imported.sym.to_string(),
                Some(ModuleExportName::Str(imported)) => imported.value.to_string(),
                None => named.local.sym.to_string(),
            };
            let renamed = name != named.local.sym.as_ref();
            self.dispatch_name(NameOccurrence {
                name,
                site: NameSite::ImportedName {
                    specifier: named,
                    import,
                    renamed,
                },
                span: named.span,
                usage: Usage::Import,
            });
        }
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if export.src.is_some() || export.type_only {
            return;
        }
        for specifier in &export.specifiers {
            if let ExportSpecifier::Named(named) = specifier {
                if let ModuleExportName::Ident(orig) = &named.orig {
                    self.reference(orig, Usage::Read);
                }
            }
        }
    }

    // Type positions never hold runtime values.
    fn visit_ts_type(&mut self, _: &TsType) {}
    fn visit_ts_type_ann(&mut self, _: &TsTypeAnn) {}
    fn visit_ts_type_param_decl(&mut self, _: &TsTypeParamDecl) {}
    fn visit_ts_type_param_instantiation(&mut self, _: &TsTypeParamInstantiation) {}
    fn visit_ts_interface_decl(&mut self, _: &TsInterfaceDecl) {}
    fn visit_ts_type_alias_decl(&mut self, _: &TsTypeAliasDecl) {}
    fn visit_ts_expr_with_type_args(&mut self, _: &TsExprWithTypeArgs) {}
}
