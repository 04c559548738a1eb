//! Engine for banned names.

use std::sync::Arc;

use super::PatternConfig;
use crate::checker::RuleRegistrar;
use crate::matchers::AbsoluteMatcher;

/// Subscribes one identifier handler per matcher, keyed by the last segment
/// of its dotted name.
pub(super) fn register(
    registrar: &mut RuleRegistrar<'_>,
    matchers: &[Arc<AbsoluteMatcher>],
    config: &Arc<PatternConfig>,
) {
    for matcher in matchers {
        let handler_matcher = Arc::clone(matcher);
        let config = Arc::clone(config);
        registrar.on_named_identifier(matcher.bare_name(), move |ctx, occurrence| {
            if !handler_matcher.matches(&occurrence.site, ctx.resolver()) {
                return;
            }
            if config.is_trusted_use(ctx, &occurrence.usage) {
                return;
            }
            config.report(ctx, occurrence.span);
        });
    }
}
