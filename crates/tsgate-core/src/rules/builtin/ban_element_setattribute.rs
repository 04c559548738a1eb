//! ban-element-setattribute rule (TT009): Disallows setting security-sensitive
//! attributes through the attribute APIs
//!
//! A literal sensitive attribute name is a high-confidence failure. Uses the
//! rule cannot see through, such as a computed attribute name or an
//! `Attr` node, are reported with low confidence.

use std::sync::Arc;

use tracing::error;

use crate::checker::{PropertyOccurrence, RuleContext, RuleRegistrar, Usage};
use crate::declare_rule;
use crate::matchers::PropertyMatcher;
use crate::rules::{Confidence, Rule, RuleMetadata};
use crate::semantic::types::string_literal;

declare_rule!(
    BanElementSetAttribute,
    id = "TT009",
    name = "ban-element-setattribute",
    description = "Disallow setting event handler and URL attributes that load or run code",
    severity = Error,
    docs_url = "https://w3c.github.io/trusted-types/dist/spec/",
    examples = "// Bad\nel.setAttribute('onclick', handler);\nscript.setAttribute('src', url);\n\n// Good\nel.setAttribute('href', url);\nel.addEventListener('click', handler);"
);

/// Attribute methods, the index of their attribute-name argument, and their
/// expected argument count.
const METHODS: &[(&str, Option<usize>, usize)] = &[
    ("setAttribute", Some(0), 2),
    ("setAttributeNS", Some(1), 3),
    ("setAttributeNode", None, 1),
    ("setAttributeNodeNS", None, 1),
];

const LOOSE_MESSAGE: &str = "Setting attributes dynamically may set a security-sensitive attribute. Review the attribute name.";

impl Rule for BanElementSetAttribute {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn register(&self, registrar: &mut RuleRegistrar<'_>) {
        for &(method, name_index, arity) in METHODS {
            let matcher = match PropertyMatcher::from_spec(&format!("Element.prototype.{method}")) {
                Ok(matcher) => Arc::new(matcher),
                Err(e) => {
                    error!("Cannot register {}: {}", self.metadata.name, e);
                    return;
                }
            };
            let handler = move |ctx: &mut RuleContext<'_>, occurrence: &PropertyOccurrence<'_>| {
                check(ctx, occurrence, &matcher, name_index, arity)
            };
            registrar.on_named_property_access(method, handler.clone());
            registrar.on_string_literal_element_access(method, handler);
        }
    }
}

fn check(
    ctx: &mut RuleContext<'_>,
    occurrence: &PropertyOccurrence<'_>,
    matcher: &PropertyMatcher,
    name_index: Option<usize>,
    arity: usize,
) {
    let receiver = ctx.resolver().type_of_expr(&occurrence.member.obj);
    if !matcher.type_matches(&receiver, ctx.resolver()) {
        return;
    }

    let span = occurrence.span();
    let (Usage::Call(args), Some(name_index)) = (occurrence.usage, name_index) else {
        ctx.add_failure_with_confidence(span, LOOSE_MESSAGE, Confidence::Low);
        return;
    };
    if args.len() != arity || args.iter().any(|arg| arg.spread.is_some()) {
        ctx.add_failure_with_confidence(span, LOOSE_MESSAGE, Confidence::Low);
        return;
    }

    match string_literal(&args[name_index].expr) {
        Some(name) if is_sensitive_attribute(&name) => ctx.add_failure_with_suggestion(
            span,
            format!("Do not set the '{name}' attribute directly: it can load or run code. Use a typed DOM property instead."),
            attribute_suggestion(&name),
        ),
        Some(_) => {}
        None => ctx.add_failure_with_confidence(span, LOOSE_MESSAGE, Confidence::Low),
    }
}

fn attribute_suggestion(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    match name.strip_prefix("on") {
        Some(event) if !event.is_empty() => {
            format!("Register the handler with addEventListener('{event}', handler)")
        }
        _ if name == "srcdoc" => {
            "Assign iframe.srcdoc a TrustedHTML value from policy.createHTML(value)".to_string()
        }
        _ => format!(
            "Assign the {name} property a TrustedScriptURL value from policy.createScriptURL(value)"
        ),
    }
}

/// Event handlers and attributes that load code. The bare name `on` is an
/// ordinary attribute.
pub fn is_sensitive_attribute(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    (name.starts_with("on") && name.len() > 2)
        || matches!(name.as_str(), "src" | "srcdoc" | "data" | "codebase")
}
