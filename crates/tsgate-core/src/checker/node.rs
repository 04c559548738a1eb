//! What the walker hands to handlers: dispatched nodes and the occurrences of
//! names and properties together with how they are used.

use swc_common::Span;
use swc_ecma_ast::{
    AssignExpr, CallExpr, Expr, ExprOrSpread, Ident, ImportDecl, ImportNamedSpecifier,
    MemberExpr, NewExpr,
};

/// Node kinds handlers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CallExpr,
    NewExpr,
    AssignExpr,
    MemberExpr,
    ImportDecl,
}

#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Call(&'a CallExpr),
    New(&'a NewExpr),
    Assign(&'a AssignExpr),
    Member(&'a MemberExpr),
    Import(&'a ImportDecl),
}

impl Node<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Call(_) => NodeKind::CallExpr,
            Node::New(_) => NodeKind::NewExpr,
            Node::Assign(_) => NodeKind::AssignExpr,
            Node::Member(_) => NodeKind::MemberExpr,
            Node::Import(_) => NodeKind::ImportDecl,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Call(call) => call.span,
            Node::New(new) => new.span,
            Node::Assign(assign) => assign.span,
            Node::Member(member) => member.span,
            Node::Import(import) => import.span,
        }
    }
}

/// How the expression at an occurrence is used by its parent.
#[derive(Debug, Clone, Copy)]
pub enum Usage<'a> {
    Read,
    Call(&'a [ExprOrSpread]),
    New(&'a [ExprOrSpread]),
    Write { value: &'a Expr, compound: bool },
    Import,
}

impl<'a> Usage<'a> {
    pub fn is_invocation(&self) -> bool {
        matches!(self, Usage::Call(_) | Usage::New(_))
    }

    /// Arguments of a call or `new`.
    pub fn args(&self) -> Option<&'a [ExprOrSpread]> {
        match *self {
            Usage::Call(args) | Usage::New(args) => Some(args),
            _ => None,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&'a Expr> {
        self.args()?.get(index).map(|arg| &*arg.expr)
    }

    /// Value assigned by a plain or compound assignment.
    pub fn written_value(&self) -> Option<&'a Expr> {
        match *self {
            Usage::Write { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Where a dispatched name occurs.
#[derive(Debug, Clone, Copy)]
pub enum NameSite<'a> {
    /// A value reference such as `eval` in `eval(x)`.
    Reference(&'a Ident),
    /// The name of a dot access such as `write` in `document.write`.
    Property(&'a MemberExpr),
    /// A name imported by a named import specifier.
    ImportedName {
        specifier: &'a ImportNamedSpecifier,
        import: &'a ImportDecl,
        renamed: bool,
    },
}

#[derive(Debug, Clone)]
pub struct NameOccurrence<'a> {
    pub name: String,
    pub site: NameSite<'a>,
    pub span: Span,
    pub usage: Usage<'a>,
}

/// A property access, by dot or by string-literal bracket.
#[derive(Debug, Clone)]
pub struct PropertyOccurrence<'a> {
    pub name: String,
    pub member: &'a MemberExpr,
    pub computed: bool,
    pub usage: Usage<'a>,
}

impl PropertyOccurrence<'_> {
    pub fn span(&self) -> Span {
        self.member.span
    }
}
