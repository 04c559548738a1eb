//! ban-function-calls rule (TT002): Disallows building functions from strings

use std::sync::Arc;

use swc_ecma_ast::ExprOrSpread;
use tracing::error;

use crate::checker::{NameOccurrence, NameSite, PropertyOccurrence, RuleContext, RuleRegistrar};
use crate::declare_rule;
use crate::matchers::{AbsoluteMatcher, PropertyMatcher};
use crate::rules::trusted_types::TRUSTED_SCRIPT;
use crate::rules::{Rule, RuleMetadata};
use crate::semantic::Type;

declare_rule!(
    BanFunctionCalls,
    id = "TT002",
    name = "ban-function-calls",
    description = "Disallow the Function constructor unless every argument is a TrustedScript",
    severity = Error,
    docs_url = "https://w3c.github.io/trusted-types/dist/spec/",
    examples = "// Bad\nconst f = new Function('a', body);\nFunction(body)();\n\n// Good\nconst f = (a) => a * 2;"
);

const MESSAGE: &str =
    "Constructing functions from strings executes them as code. Pass TrustedScript values only.";
const SUGGESTION: &str = "Write the function as an arrow function or declaration";

impl Rule for BanFunctionCalls {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn register(&self, registrar: &mut RuleRegistrar<'_>) {
        let (function, prototype) = match (
            AbsoluteMatcher::new("GLOBAL|Function"),
            PropertyMatcher::from_spec("Function.prototype.constructor"),
        ) {
            (Ok(function), Ok(prototype)) => (Arc::new(function), Arc::new(prototype)),
            (Err(e), _) | (_, Err(e)) => {
                error!("Cannot register {}: {}", self.metadata.name, e);
                return;
            }
        };

        registrar.on_named_identifier("Function", move |ctx, occurrence| {
            check_function(ctx, occurrence, &function)
        });

        let constructor = move |ctx: &mut RuleContext<'_>, occurrence: &PropertyOccurrence<'_>| {
            check_constructor(ctx, occurrence, &prototype)
        };
        registrar.on_named_property_access("constructor", constructor.clone());
        registrar.on_string_literal_element_access("constructor", constructor);
    }
}

/// `Function(...)` and `new Function(...)`, also when reached through the
/// global object as in `new window.Function(...)`.
fn check_function(ctx: &mut RuleContext<'_>, occurrence: &NameOccurrence<'_>, matcher: &AbsoluteMatcher) {
    if matches!(occurrence.site, NameSite::ImportedName { .. }) {
        return;
    }
    let Some(args) = occurrence.usage.args() else {
        return;
    };
    if !matcher.matches(&occurrence.site, ctx.resolver()) || all_trusted(ctx, args) {
        return;
    }
    ctx.add_failure_with_suggestion(occurrence.span, MESSAGE, SUGGESTION);
}

/// `fn.constructor(...)`, which reaches the Function constructor from any
/// function value.
fn check_constructor(
    ctx: &mut RuleContext<'_>,
    occurrence: &PropertyOccurrence<'_>,
    prototype: &PropertyMatcher,
) {
    let Some(args) = occurrence.usage.args() else {
        return;
    };
    let receiver = ctx.resolver().type_of_expr(&occurrence.member.obj);
    let is_function = receiver
        .constituents()
        .iter()
        .any(|ty| matches!(ty, Type::Function(_)))
        || prototype.type_matches(&receiver, ctx.resolver());
    if !is_function || all_trusted(ctx, args) {
        return;
    }
    ctx.add_failure_with_suggestion(occurrence.span(), MESSAGE, SUGGESTION);
}

fn all_trusted(ctx: &RuleContext<'_>, args: &[ExprOrSpread]) -> bool {
    args.iter()
        .all(|arg| arg.spread.is_none() && ctx.is_trusted(&arg.expr, TRUSTED_SCRIPT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::pattern::tests::{run_rule_on, suggestions_of};

    fn run_function_rule(code: &str) -> Vec<String> {
        run_rule_on(&BanFunctionCalls::new(), &[("/p/app.ts", code)])
    }

    #[test]
    fn flags_calls_and_construction() {
        let failures = run_function_rule("Function('return 1')();\nnew Function('a', 'return a');");

        assert_eq!(failures, vec!["Function", "Function"]);
    }

    #[test]
    fn looks_through_parentheses() {
        let failures = run_function_rule("(Function)('return 1');\n(0, Function)('x');");

        assert_eq!(failures.len(), 1, "only the parenthesized callee is a direct call");
    }

    #[test]
    fn allows_trusted_script_arguments() {
        let failures = run_function_rule(
            "declare const body: TrustedScript;\n\
             declare const arg: TrustedScript;\n\
             new Function(arg, body);\n\
             new Function('a', body);",
        );

        assert_eq!(failures, vec!["Function"], "one untrusted argument is enough");
    }

    #[test]
    fn flags_constructor_through_function_values() {
        let failures = run_function_rule(
            "Function.prototype.constructor('return 1');\n\
             const f = () => 1;\n\
             f.constructor('return 2');\n\
             f['constructor']('return 3');\n\
             class Widget {}\n\
             new Widget().constructor;",
        );

        assert_eq!(
            failures,
            vec![
                "Function.prototype.constructor",
                "f.constructor",
                "f['constructor']"
            ]
        );
    }

    #[test]
    fn flags_construction_through_the_global_object() {
        let failures = run_function_rule(
            "declare const body: string;\n\
             new window.Function(body);\n\
             globalThis.Function('return 1')();\n\
             self.Function('x');",
        );

        assert_eq!(
            failures,
            vec!["window.Function", "globalThis.Function", "self.Function"]
        );
    }

    #[test]
    fn failures_suggest_a_function_literal() {
        let suggestions = suggestions_of(&BanFunctionCalls::new(), "new Function('return 1');");

        assert_eq!(suggestions, vec![Some(SUGGESTION.to_string())]);
    }

    #[test]
    fn members_named_function_are_not_flagged() {
        let failures = run_function_rule(
            "const factory = { Function: (s: string) => s };\nfactory.Function('x');",
        );

        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    }

    #[test]
    fn plain_references_are_not_flagged() {
        let failures = run_function_rule(
            "const isFn = (x: unknown) => x instanceof Function;\nconst F = Function;",
        );

        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    }
}
