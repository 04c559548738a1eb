//! Proofs that a value flowing into a sink is a Trusted Type.
//!
//! A value is accepted when it is statically typed as the allowed Trusted
//! Type, when it is such a value cast to `string` through `unknown`, when it
//! is cast from a union of the Trusted Type and strings, or when it is the
//! result of a call whose first argument is the Trusted Type.

use swc_ecma_ast::{Expr, TsKeywordTypeKind, TsType};

use crate::config::TrustedTypesConfig;
use crate::matchers::dealias;
use crate::parser::is_declaration_file;
use crate::semantic::{SymbolId, Type, TypeResolver};

pub const TRUSTED_HTML: &str = "TrustedHTML";
pub const TRUSTED_SCRIPT: &str = "TrustedScript";
pub const TRUSTED_SCRIPT_URL: &str = "TrustedScriptURL";

/// How to produce a value of the Trusted Type `name` with a policy.
pub fn policy_suggestion(name: &str) -> Option<String> {
    let factory = match name {
        TRUSTED_HTML => "createHTML",
        TRUSTED_SCRIPT => "createScript",
        TRUSTED_SCRIPT_URL => "createScriptURL",
        _ => return None,
    };
    Some(format!(
        "Create the value with a Trusted Types policy: policy.{factory}(value)"
    ))
}

/// Which declarations of a Trusted Type name are the real thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedTypes {
    allow_ambient: bool,
    module_paths: Vec<String>,
}

impl Default for TrustedTypes {
    fn default() -> Self {
        Self::from(&TrustedTypesConfig::default())
    }
}

impl From<&TrustedTypesConfig> for TrustedTypes {
    fn from(config: &TrustedTypesConfig) -> Self {
        Self {
            allow_ambient: config.allow_ambient,
            module_paths: config.module_paths.clone(),
        }
    }
}

impl TrustedTypes {
    /// Whether `id` is the Trusted Type `name` declared where trusted
    /// declarations live: globally in declaration files, or in one of the
    /// configured module paths.
    pub fn is_trusted_symbol(&self, resolver: &dyn TypeResolver, id: SymbolId, name: &str) -> bool {
        let id = dealias(resolver, id);
        let symbol = resolver.symbol(id);
        if symbol.name != name || symbol.declarations.is_empty() {
            return false;
        }

        let paths: Vec<&str> = symbol
            .declarations
            .iter()
            .map(|d| resolver.file_path(d.file))
            .collect();

        let ambient = !resolver.fully_qualified_name(id).starts_with('"')
            && paths.iter().all(|path| is_declaration_file(path));
        if self.allow_ambient && ambient {
            return true;
        }
        paths
            .iter()
            .any(|path| self.module_paths.iter().any(|m| path.contains(m.as_str())))
    }

    /// The type is the Trusted Type, or an intersection with it.
    pub fn is_trusted_type(&self, resolver: &dyn TypeResolver, ty: &Type, name: &str) -> bool {
        match ty {
            Type::Object(id) => self.is_trusted_symbol(resolver, *id, name),
            Type::Intersection(types) => types.iter().any(|t| match t {
                Type::Object(id) => self.is_trusted_symbol(resolver, *id, name),
                _ => false,
            }),
            _ => false,
        }
    }

    pub fn proves(&self, resolver: &dyn TypeResolver, expr: &Expr, name: &str) -> bool {
        let expr = peel(expr);
        if self.is_trusted_type(resolver, &resolver.type_of_expr(expr), name) {
            return true;
        }

        if let Some((operand, _)) = cast(expr) {
            // `x as unknown as string`
            if let Some((inner, target)) = cast(operand) {
                if is_unknown(target)
                    && self.is_trusted_type(resolver, &resolver.type_of_expr(inner), name)
                {
                    return true;
                }
            }

            // `(x as TrustedHTML | string) as string`, or `x` annotated so.
            if let Type::Union(members) = resolver.type_of_expr(operand) {
                let has_trusted = members
                    .iter()
                    .any(|member| self.is_trusted_type(resolver, member, name));
                let rest_are_strings = members.iter().all(|member| {
                    member.is_string_like() || self.is_trusted_type(resolver, member, name)
                });
                if has_trusted && rest_are_strings {
                    return true;
                }
            }
            return false;
        }

        // Unwrapping helpers: `unwrapHtml(trusted)`.
        if let Expr::Call(call) = expr {
            return call.args.first().is_some_and(|arg| {
                arg.spread.is_none()
                    && self.is_trusted_type(resolver, &resolver.type_of_expr(peel(&arg.expr)), name)
            });
        }
        false
    }
}

fn peel(mut expr: &Expr) -> &Expr {
    loop {
        match expr {
            Expr::Paren(paren) => expr = &paren.expr,
            Expr::TsNonNull(inner) => expr = &inner.expr,
            _ => return expr,
        }
    }
}

/// Operand and target type of `e as T` or `<T>e`.
fn cast(expr: &Expr) -> Option<(&Expr, &TsType)> {
    match peel(expr) {
        Expr::TsAs(cast) => Some((peel(&cast.expr), &cast.type_ann)),
        Expr::TsTypeAssertion(cast) => Some((peel(&cast.expr), &cast.type_ann)),
        _ => None,
    }
}

fn is_unknown(ty: &TsType) -> bool {
    match ty {
        TsType::TsKeywordType(keyword) => matches!(
            keyword.kind,
            TsKeywordTypeKind::TsUnknownKeyword | TsKeywordTypeKind::TsAnyKeyword
        ),
        TsType::TsParenthesizedType(inner) => is_unknown(&inner.type_ann),
        _ => false,
    }
}
