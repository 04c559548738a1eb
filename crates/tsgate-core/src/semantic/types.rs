//! Declared types as seen by the resolver.
//!
//! Types are derived from annotations and from the shape of initializers; there
//! is no inference beyond what the checks need to prove a value is trusted.

use swc_ecma_ast::{
    BinaryOp, Callee, Expr, Function, Lit, MemberExpr, MemberProp, OptChainBase, Pat, TsFnParam,
    TsType, UnaryOp,
};

use super::SpanKey;
use super::symbols::SymbolId;
use crate::program::FileId;

/// Member name under which a numeric index signature is bound.
pub const INDEX_MEMBER: &str = "[index]";

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Any,
    Unknown,
    Never,
    Void,
    Null,
    Undefined,
    String,
    StringLiteral(String),
    Number,
    Boolean,
    /// Instance of a class or interface.
    Object(SymbolId),
    /// The constructor value of a class.
    Class(SymbolId),
    Namespace(SymbolId),
    Module(FileId),
    /// `typeof globalThis`: members are the global declarations.
    Global,
    Function(Vec<Signature>),
    Union(Vec<Type>),
    Intersection(Vec<Type>),
}

impl Type {
    pub fn union(types: Vec<Type>) -> Type {
        let mut flat = Vec::new();
        for ty in types {
            match ty {
                Type::Union(inner) => flat.extend(inner),
                other if !flat.contains(&other) => flat.push(other),
                _ => {}
            }
        }
        match flat.len() {
            0 => Type::Never,
            1 => flat.remove(0),
            _ => Type::Union(flat),
        }
    }

    pub fn intersection(types: Vec<Type>) -> Type {
        let mut flat = Vec::new();
        for ty in types {
            match ty {
                Type::Intersection(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            1 => flat.remove(0),
            _ => Type::Intersection(flat),
        }
    }

    pub fn is_string_like(&self) -> bool {
        match self {
            Type::String | Type::StringLiteral(_) => true,
            Type::Union(types) | Type::Intersection(types) => types.iter().any(Type::is_string_like),
            _ => false,
        }
    }

    /// Symbol of a class or interface instance type.
    pub fn object_symbol(&self) -> Option<SymbolId> {
        match self {
            Type::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Members of a union or intersection, or the type itself.
    pub fn constituents(&self) -> &[Type] {
        match self {
            Type::Union(types) | Type::Intersection(types) => types,
            other => std::slice::from_ref(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Unevaluated signature: parameter and return annotations.
#[derive(Debug, Clone)]
pub(crate) struct SignatureSource {
    pub params: Vec<Option<Box<TsType>>>,
    pub ret: Option<Box<TsType>>,
}

impl SignatureSource {
    pub fn of_function(function: &Function) -> Self {
        Self {
            params: function.params.iter().map(|p| pat_annotation(&p.pat)).collect(),
            ret: function.return_type.as_ref().map(|t| t.type_ann.clone()),
        }
    }

    pub fn of_fn_params(params: &[TsFnParam], ret: Option<&TsType>) -> Self {
        Self {
            params: params
                .iter()
                .map(|param| match param {
                    TsFnParam::Ident(ident) => ident.type_ann.as_ref().map(|t| t.type_ann.clone()),
                    _ => None,
                })
                .collect(),
            ret: ret.map(|t| Box::new(t.clone())),
        }
    }
}

pub(crate) fn pat_annotation(pat: &Pat) -> Option<Box<TsType>> {
    match pat {
        Pat::Ident(ident) => ident.type_ann.as_ref().map(|t| t.type_ann.clone()),
        Pat::Assign(assign) => pat_annotation(&assign.left),
        _ => None,
    }
}

/// The typing-relevant skeleton of an expression.
///
/// Initializers are stored as shapes so that a variable's type can be derived
/// after every declaration in the program has been bound.
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    Known(Type),
    Annotated(Box<TsType>),
    Ident(SpanKey),
    Member(Box<Shape>, String),
    /// Bracket access by a non-literal or numeric key.
    Index(Box<Shape>),
    Call(Box<Shape>, Option<String>),
    New(Box<Shape>),
    Either(Vec<Shape>),
    Unknown,
}

impl Shape {
    pub fn of(expr: &Expr) -> Shape {
        match expr {
            Expr::Lit(Lit::Str(s)) => Shape::Known(Type::StringLiteral(s.value.to_string())),
            Expr::Lit(Lit::Num(_)) => Shape::Known(Type::Number),
            Expr::Lit(Lit::Bool(_)) => Shape::Known(Type::Boolean),
            Expr::Lit(Lit::Null(_)) => Shape::Known(Type::Null),
            Expr::Tpl(_) => Shape::Known(Type::String),
            Expr::Ident(ident) if ident.sym.as_ref() == "undefined" => {
                Shape::Known(Type::Undefined)
            }
            Expr::Ident(ident) => Shape::Ident(SpanKey::from(ident.span)),
            Expr::Paren(paren) => Shape::of(&paren.expr),
            Expr::TsNonNull(inner) => Shape::of(&inner.expr),
            Expr::TsConstAssertion(inner) => Shape::of(&inner.expr),
            Expr::TsSatisfies(inner) => Shape::of(&inner.expr),
            Expr::Await(inner) => Shape::of(&inner.arg),
            Expr::TsAs(cast) => Shape::Annotated(cast.type_ann.clone()),
            Expr::TsTypeAssertion(cast) => Shape::Annotated(cast.type_ann.clone()),
            Expr::Member(member) => Shape::of_member(member),
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => Shape::Call(
                    Box::new(Shape::of(callee)),
                    call.args.first().and_then(|arg| string_literal(&arg.expr)),
                ),
                _ => Shape::Unknown,
            },
            Expr::New(new) => Shape::New(Box::new(Shape::of(&new.callee))),
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(member) => Shape::of_member(member),
                OptChainBase::Call(call) => Shape::Call(
                    Box::new(Shape::of(&call.callee)),
                    call.args.first().and_then(|arg| string_literal(&arg.expr)),
                ),
            },
            Expr::Arrow(_) | Expr::Fn(_) => Shape::Known(Type::Function(vec![Signature {
                params: Vec::new(),
                ret: Type::Unknown,
            }])),
            Expr::Cond(cond) => Shape::Either(vec![Shape::of(&cond.cons), Shape::of(&cond.alt)]),
            Expr::Bin(bin) => match bin.op {
                BinaryOp::LogicalOr | BinaryOp::LogicalAnd | BinaryOp::NullishCoalescing => {
                    Shape::Either(vec![Shape::of(&bin.left), Shape::of(&bin.right)])
                }
                BinaryOp::Add if is_stringish(&bin.left) || is_stringish(&bin.right) => {
                    Shape::Known(Type::String)
                }
                BinaryOp::EqEq
                | BinaryOp::NotEq
                | BinaryOp::EqEqEq
                | BinaryOp::NotEqEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::In
                | BinaryOp::InstanceOf => Shape::Known(Type::Boolean),
                _ => Shape::Unknown,
            },
            Expr::Unary(unary) => match unary.op {
                UnaryOp::TypeOf => Shape::Known(Type::String),
                UnaryOp::Bang | UnaryOp::Delete => Shape::Known(Type::Boolean),
                UnaryOp::Void => Shape::Known(Type::Undefined),
                _ => Shape::Known(Type::Number),
            },
            Expr::Seq(seq) => seq.exprs.last().map_or(Shape::Unknown, |e| Shape::of(e)),
            Expr::Assign(assign) => Shape::of(&assign.right),
            _ => Shape::Unknown,
        }
    }

    fn of_member(member: &MemberExpr) -> Shape {
        let object = Box::new(Shape::of(&member.obj));
        match (&member.prop, member_name(&member.prop)) {
            (_, Some(name)) => Shape::Member(object, name),
            (MemberProp::Computed(_), None) => Shape::Index(object),
            _ => Shape::Unknown,
        }
    }
}

fn is_stringish(expr: &Expr) -> bool {
    matches!(expr, Expr::Lit(Lit::Str(_)) | Expr::Tpl(_))
}

/// Name of a dot access or of a bracket access keyed by a string literal.
pub fn member_name(prop: &MemberProp) -> Option<String> {
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.to_string()),
        MemberProp::Computed(computed) => string_literal(&computed.expr),
        MemberProp::PrivateName(_) => None,
    }
}

pub fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            tpl.quasis.first().map(|quasi| quasi.raw.to_string())
        }
        Expr::Paren(paren) => string_literal(&paren.expr),
        _ => None,
    }
}
