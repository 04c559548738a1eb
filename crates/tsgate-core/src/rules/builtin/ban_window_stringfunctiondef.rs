//! ban-window-stringfunctiondef rule (TT023): Disallows passing strings to
//! setTimeout and setInterval

use std::sync::Arc;

use swc_common::Span;
use tracing::error;

use crate::checker::{NameSite, PropertyOccurrence, RuleContext, RuleRegistrar, Usage};
use crate::declare_rule;
use crate::matchers::{AbsoluteMatcher, PropertyMatcher};
use crate::rules::trusted_types::TRUSTED_SCRIPT;
use crate::rules::{Rule, RuleMetadata};

declare_rule!(
    BanWindowStringFunctionDef,
    id = "TT023",
    name = "ban-window-stringfunctiondef",
    description = "Disallow string handlers for setTimeout and setInterval",
    severity = Error,
    docs_url = "https://w3c.github.io/trusted-types/dist/spec/",
    examples = "// Bad\nsetTimeout('tick()', 100);\nwindow.setInterval(code, 100);\n\n// Good\nsetTimeout(tick, 100);\nsetTimeout(() => tick(), 100);"
);

const MESSAGE: &str = "Passing a string as the handler evaluates it as code. Pass a function or a TrustedScript value.";

const TIMERS: [&str; 2] = ["setTimeout", "setInterval"];

impl Rule for BanWindowStringFunctionDef {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn register(&self, registrar: &mut RuleRegistrar<'_>) {
        for timer in TIMERS {
            let (global, method) = match (
                AbsoluteMatcher::new(&format!("GLOBAL|{timer}")),
                PropertyMatcher::from_spec(&format!("Window.prototype.{timer}")),
            ) {
                (Ok(global), Ok(method)) => (Arc::new(global), Arc::new(method)),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Cannot register {}: {}", self.metadata.name, e);
                    return;
                }
            };

            registrar.on_named_identifier(timer, move |ctx, occurrence| {
                if matches!(occurrence.site, NameSite::Reference(_))
                    && global.matches(&occurrence.site, ctx.resolver())
                {
                    check_handler(ctx, occurrence.span, occurrence.usage);
                }
            });

            let on_window = move |ctx: &mut RuleContext<'_>, occurrence: &PropertyOccurrence<'_>| {
                let receiver = ctx.resolver().type_of_expr(&occurrence.member.obj);
                if method.type_matches(&receiver, ctx.resolver()) {
                    check_handler(ctx, occurrence.span(), occurrence.usage);
                }
            };
            registrar.on_named_property_access(timer, on_window.clone());
            registrar.on_string_literal_element_access(timer, on_window);
        }
    }
}

/// Flags an invocation whose handler argument is typed as a string. Values of
/// unknown type are left alone.
fn check_handler(ctx: &mut RuleContext<'_>, span: Span, usage: Usage<'_>) {
    if !usage.is_invocation() {
        return;
    }
    let Some(handler) = usage.args().and_then(|args| args.first()) else {
        return;
    };
    if handler.spread.is_some() {
        return;
    }
    let handler = &*handler.expr;
    if ctx.resolver().type_of_expr(handler).is_string_like() && !ctx.is_trusted(handler, TRUSTED_SCRIPT) {
        ctx.add_failure_with_suggestion(span, MESSAGE, "Wrap the code in a function: () => { ... }");
    }
}
