//! Engine for banned properties, reached by dot or by string-literal bracket.

use std::sync::Arc;

use super::PatternConfig;
use crate::checker::{PropertyOccurrence, RuleContext, RuleRegistrar, Usage};
use crate::matchers::PropertyMatcher;

/// Accesses a property pattern reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Access {
    Any,
    /// Only assignment targets, plain or compound.
    Write,
}

pub(super) fn register(
    registrar: &mut RuleRegistrar<'_>,
    matchers: &[Arc<PropertyMatcher>],
    access: Access,
    config: &Arc<PatternConfig>,
) {
    for matcher in matchers {
        let handler = {
            let matcher = Arc::clone(matcher);
            let config = Arc::clone(config);
            move |ctx: &mut RuleContext<'_>, occurrence: &PropertyOccurrence<'_>| {
                check(ctx, occurrence, &matcher, access, &config)
            }
        };
        registrar.on_named_property_access(matcher.banned_property(), handler.clone());
        registrar.on_string_literal_element_access(matcher.banned_property(), handler);
    }
}

fn check(
    ctx: &mut RuleContext<'_>,
    occurrence: &PropertyOccurrence<'_>,
    matcher: &PropertyMatcher,
    access: Access,
    config: &PatternConfig,
) {
    if access == Access::Write && !matches!(occurrence.usage, Usage::Write { .. }) {
        return;
    }
    let receiver = ctx.resolver().type_of_expr(&occurrence.member.obj);
    if !matcher.type_matches(&receiver, ctx.resolver()) {
        return;
    }
    if config.is_trusted_use(ctx, &occurrence.usage) {
        return;
    }
    config.report(ctx, occurrence.span());
}
