//! ban-document-execcommand rule (TT005): Disallows execCommand('insertHTML')

use std::sync::Arc;

use tracing::error;

use crate::checker::{PropertyOccurrence, RuleContext, RuleRegistrar};
use crate::declare_rule;
use crate::matchers::PropertyMatcher;
use crate::rules::{Rule, RuleMetadata};
use crate::semantic::types::string_literal;

declare_rule!(
    BanDocumentExecCommand,
    id = "TT005",
    name = "ban-document-execcommand",
    description = "Disallow Document#execCommand unless the command is a literal other than insertHTML",
    severity = Error,
    docs_url = "https://w3c.github.io/trusted-types/dist/spec/",
    examples = "// Bad\ndocument.execCommand('insertHTML', false, html);\ndocument.execCommand(command);\n\n// Good\ndocument.execCommand('bold');"
);

const MESSAGE: &str =
    "Do not use document.execCommand('insertHTML'): it inserts markup without Trusted Types checks.";
const SUGGESTION: &str =
    "Insert the markup through a Trusted Types sink such as element.innerHTML = policy.createHTML(value)";

impl Rule for BanDocumentExecCommand {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn register(&self, registrar: &mut RuleRegistrar<'_>) {
        let matcher = match PropertyMatcher::from_spec("Document.prototype.execCommand") {
            Ok(matcher) => Arc::new(matcher),
            Err(e) => {
                error!("Cannot register {}: {}", self.metadata.name, e);
                return;
            }
        };

        let handler = move |ctx: &mut RuleContext<'_>, occurrence: &PropertyOccurrence<'_>| {
            check(ctx, occurrence, &matcher)
        };
        registrar.on_named_property_access("execCommand", handler.clone());
        registrar.on_string_literal_element_access("execCommand", handler);
    }
}

fn check(ctx: &mut RuleContext<'_>, occurrence: &PropertyOccurrence<'_>, matcher: &PropertyMatcher) {
    let receiver = ctx.resolver().type_of_expr(&occurrence.member.obj);
    if !matcher.type_matches(&receiver, ctx.resolver()) {
        return;
    }

    // Only a literal command name can be shown to be harmless.
    let harmless = occurrence
        .usage
        .arg(0)
        .and_then(string_literal)
        .is_some_and(|command| !command.eq_ignore_ascii_case("inserthtml"));
    if harmless {
        return;
    }
    ctx.add_failure_with_suggestion(occurrence.span(), MESSAGE, SUGGESTION);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::pattern::tests::{run_rule_on, suggestions_of};

    fn run_execcommand_rule(code: &str) -> Vec<String> {
        run_rule_on(&BanDocumentExecCommand::new(), &[("/p/app.ts", code)])
    }

    #[test]
    fn flags_insert_html_in_any_case() {
        let failures = run_execcommand_rule(
            "declare const html: string;\n\
             document.execCommand('insertHTML', false, html);\n\
             document.execCommand('INSERTHTML', false, html);",
        );

        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn allows_other_literal_commands() {
        let failures = run_execcommand_rule(
            "document.execCommand('bold');\ndocument['execCommand']('copy');",
        );

        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    }

    #[test]
    fn non_literal_commands_are_always_flagged() {
        let failures = run_execcommand_rule(
            "declare const command: string;\n\
             document.execCommand(command);\n\
             document['execCommand'](`${command}`);\n\
             const exec = document.execCommand;",
        );

        assert_eq!(
            failures,
            vec![
                "document.execCommand",
                "document['execCommand']",
                "document.execCommand"
            ]
        );
    }

    #[test]
    fn other_receivers_are_ignored() {
        let failures = run_execcommand_rule(
            "declare const editor: { execCommand(name: string): void };\neditor.execCommand('insertHTML');",
        );

        assert!(failures.is_empty());
    }

    #[test]
    fn failures_suggest_a_trusted_sink() {
        let suggestions = suggestions_of(
            &BanDocumentExecCommand::new(),
            "document.execCommand('insertHTML', false, '<b>x</b>');",
        );

        assert_eq!(suggestions, vec![Some(SUGGESTION.to_string())]);
    }
}
