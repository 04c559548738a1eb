//! Built-in Trusted Types conformance rules
//!
//! Most rules are conformance patterns described by a table entry. The four
//! whose policy depends on argument shapes are written by hand.

pub mod ban_document_execcommand;
pub mod ban_element_setattribute;
pub mod ban_function_calls;
pub mod ban_window_stringfunctiondef;

use std::borrow::Cow;

use tracing::error;

pub use ban_document_execcommand::BanDocumentExecCommand;
pub use ban_element_setattribute::BanElementSetAttribute;
pub use ban_function_calls::BanFunctionCalls;
pub use ban_window_stringfunctiondef::BanWindowStringFunctionDef;

use super::pattern::{PatternConfig, PatternKind, PatternRule, RuleBuildError, TrustedArgument};
use super::trusted_types::{TRUSTED_HTML, TRUSTED_SCRIPT, TRUSTED_SCRIPT_URL, policy_suggestion};
use super::{Rule, RuleMetadata, RuleRegistry, Severity};

const DOCS_URL: &str = "https://w3c.github.io/trusted-types/dist/spec/";

struct BuiltinPattern {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    examples: Option<&'static str>,
    kind: PatternKind,
    values: &'static [&'static str],
    message: &'static str,
    trusted_type: Option<&'static str>,
    trusted_argument: TrustedArgument,
}

impl BuiltinPattern {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: Cow::Borrowed(self.id),
            name: Cow::Borrowed(self.name),
            description: Cow::Borrowed(self.description),
            severity: Severity::Error,
            docs_url: Some(DOCS_URL),
            examples: self.examples,
        }
    }

    fn config(&self) -> PatternConfig {
        let mut config = PatternConfig::new(self.kind, self.values, self.message)
            .trusted_argument(self.trusted_argument);
        if let Some(trusted_type) = self.trusted_type {
            config = config.allowing(trusted_type);
            if let Some(suggestion) = policy_suggestion(trusted_type) {
                config = config.suggesting(suggestion);
            }
        }
        config
    }

    fn build(&self) -> Result<PatternRule, RuleBuildError> {
        PatternRule::new(self.metadata(), self.config())
    }
}

const FIRST: TrustedArgument = TrustedArgument::Index(0);

const PATTERNS: &[BuiltinPattern] = &[
    BuiltinPattern {
        id: "TT001",
        name: "ban-eval-calls",
        description: "Disallow eval() unless its argument is a TrustedScript",
        examples: Some("// Bad\neval(code);\n\n// Good\neval(policy.createScript(code));"),
        kind: PatternKind::BannedName,
        values: &["GLOBAL|eval"],
        message: "Do not use eval(): it executes strings as code. Pass a TrustedScript created by a policy.",
        trusted_type: Some(TRUSTED_SCRIPT),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT003",
        name: "ban-document-write-calls",
        description: "Disallow Document#write",
        examples: Some("// Bad\ndocument.write(html);\n\n// Good\ndocument.body.append(node);"),
        kind: PatternKind::BannedProperty,
        values: &["Document.prototype.write"],
        message: "Do not use Document#write: it parses its arguments as HTML.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT004",
        name: "ban-document-writeln-calls",
        description: "Disallow Document#writeln",
        examples: None,
        kind: PatternKind::BannedProperty,
        values: &["Document.prototype.writeln"],
        message: "Do not use Document#writeln: it parses its arguments as HTML.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT006",
        name: "ban-element-innerhtml-assignments",
        description: "Disallow assigning strings to Element#innerHTML",
        examples: Some("// Bad\nel.innerHTML = html;\n\n// Good\nel.innerHTML = policy.createHTML(html);\nel.textContent = text;"),
        kind: PatternKind::BannedPropertyWrite,
        values: &["Element.prototype.innerHTML", "ShadowRoot.prototype.innerHTML"],
        message: "Assigning directly to innerHTML can lead to XSS. Assign a TrustedHTML value instead.",
        trusted_type: Some(TRUSTED_HTML),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT007",
        name: "ban-element-outerhtml-assignments",
        description: "Disallow assigning strings to Element#outerHTML",
        examples: None,
        kind: PatternKind::BannedPropertyWrite,
        values: &["Element.prototype.outerHTML"],
        message: "Assigning directly to outerHTML can lead to XSS. Assign a TrustedHTML value instead.",
        trusted_type: Some(TRUSTED_HTML),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT008",
        name: "ban-element-insertadjacenthtml",
        description: "Disallow Element#insertAdjacentHTML with string markup",
        examples: Some("// Bad\nel.insertAdjacentHTML('beforeend', html);\n\n// Good\nel.insertAdjacentHTML('beforeend', policy.createHTML(html));"),
        kind: PatternKind::BannedProperty,
        values: &["Element.prototype.insertAdjacentHTML"],
        message: "Do not pass strings to insertAdjacentHTML: it parses them as HTML. Pass a TrustedHTML value.",
        trusted_type: Some(TRUSTED_HTML),
        trusted_argument: TrustedArgument::Index(1),
    },
    BuiltinPattern {
        id: "TT010",
        name: "ban-domparser-parsefromstring",
        description: "Disallow DOMParser#parseFromString",
        examples: None,
        kind: PatternKind::BannedProperty,
        values: &["DOMParser.prototype.parseFromString"],
        message: "Using DOMParser#parseFromString to parse untrusted input into DOM elements can lead to XSS.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT011",
        name: "ban-range-createcontextualfragment",
        description: "Disallow Range#createContextualFragment",
        examples: None,
        kind: PatternKind::BannedProperty,
        values: &["Range.prototype.createContextualFragment"],
        message: "Using Range#createContextualFragment to convert strings into DOM fragments can lead to XSS.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT012",
        name: "ban-script-content-assignments",
        description: "Disallow assigning strings to the content of script elements",
        examples: Some("// Bad\nscript.text = code;\n\n// Good\nscript.text = policy.createScript(code);"),
        kind: PatternKind::BannedPropertyWrite,
        values: &[
            "HTMLScriptElement.prototype.text",
            "HTMLScriptElement.prototype.textContent",
            "HTMLScriptElement.prototype.innerText",
        ],
        message: "Do not assign strings to the content of a script element. Assign a TrustedScript value.",
        trusted_type: Some(TRUSTED_SCRIPT),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT013",
        name: "ban-script-src-assignments",
        description: "Disallow assigning strings to HTMLScriptElement#src",
        examples: None,
        kind: PatternKind::BannedPropertyWrite,
        values: &["HTMLScriptElement.prototype.src"],
        message: "Do not assign strings to the src of a script element. Assign a TrustedScriptURL value.",
        trusted_type: Some(TRUSTED_SCRIPT_URL),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT014",
        name: "ban-script-appendchild-calls",
        description: "Disallow inserting text into script elements",
        examples: None,
        kind: PatternKind::BannedProperty,
        values: &[
            "HTMLScriptElement.prototype.appendChild",
            "HTMLScriptElement.prototype.append",
            "HTMLScriptElement.prototype.insertBefore",
            "HTMLScriptElement.prototype.replaceChild",
        ],
        message: "Do not insert nodes into a script element: text nodes become executable code.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT015",
        name: "ban-iframe-srcdoc-assignments",
        description: "Disallow assigning to HTMLIFrameElement#srcdoc",
        examples: None,
        kind: PatternKind::BannedPropertyWrite,
        values: &["HTMLIFrameElement.prototype.srcdoc"],
        message: "Assigning to an iframe's srcdoc renders it as HTML and can lead to XSS.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT016",
        name: "ban-base-href-assignments",
        description: "Disallow assigning to HTMLBaseElement#href",
        examples: None,
        kind: PatternKind::BannedPropertyWrite,
        values: &["HTMLBaseElement.prototype.href"],
        message: "Assigning to a base element's href changes where every relative script loads from.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT017",
        name: "ban-object-data-assignments",
        description: "Disallow assigning strings to HTMLObjectElement#data",
        examples: None,
        kind: PatternKind::BannedPropertyWrite,
        values: &["HTMLObjectElement.prototype.data"],
        message: "Do not assign strings to the data of an object element. Assign a TrustedScriptURL value.",
        trusted_type: Some(TRUSTED_SCRIPT_URL),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT018",
        name: "ban-worker-calls",
        description: "Disallow constructing a Worker from a string URL",
        examples: Some("// Bad\nnew Worker(url);\n\n// Good\nnew Worker(policy.createScriptURL(url));"),
        kind: PatternKind::BannedName,
        values: &["GLOBAL|Worker"],
        message: "Constructing a Worker from a string URL can run untrusted code. Pass a TrustedScriptURL.",
        trusted_type: Some(TRUSTED_SCRIPT_URL),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT019",
        name: "ban-shared-worker-calls",
        description: "Disallow constructing a SharedWorker from a string URL",
        examples: None,
        kind: PatternKind::BannedName,
        values: &["GLOBAL|SharedWorker"],
        message: "Constructing a SharedWorker from a string URL can run untrusted code. Pass a TrustedScriptURL.",
        trusted_type: Some(TRUSTED_SCRIPT_URL),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT020",
        name: "ban-serviceworkercontainer-register",
        description: "Disallow registering service workers from string URLs",
        examples: None,
        kind: PatternKind::BannedProperty,
        values: &["ServiceWorkerContainer.prototype.register"],
        message: "Registering a service worker from a string URL can run untrusted code. Pass a TrustedScriptURL.",
        trusted_type: Some(TRUSTED_SCRIPT_URL),
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT021",
        name: "ban-worker-importscripts",
        description: "Disallow importScripts() with string URLs",
        examples: None,
        kind: PatternKind::BannedName,
        values: &["GLOBAL|importScripts"],
        message: "Do not pass string URLs to importScripts(). Pass TrustedScriptURL values.",
        trusted_type: Some(TRUSTED_SCRIPT_URL),
        trusted_argument: TrustedArgument::All,
    },
    BuiltinPattern {
        id: "TT022",
        name: "ban-trustedtypes-createpolicy",
        description: "Flag Trusted Types policy creation for security review",
        examples: None,
        kind: PatternKind::BannedProperty,
        values: &["TrustedTypePolicyFactory.prototype.createPolicy"],
        message: "Creating a Trusted Types policy requires a security review.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT024",
        name: "ban-legacy-conversions",
        description: "Disallow legacy unchecked conversions to Trusted Types",
        examples: None,
        kind: PatternKind::BannedName,
        values: &[
            "/node_modules/safevalues/restricted/legacy|legacyUnsafeHtml",
            "/node_modules/safevalues/restricted/legacy|legacyUnsafeScript",
            "/node_modules/safevalues/restricted/legacy|legacyUnsafeScriptUrl",
        ],
        message: "Legacy conversions are unchecked and only meant for migrating existing code.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
    BuiltinPattern {
        id: "TT025",
        name: "ban-reviewed-conversions",
        description: "Flag reviewed conversions to Trusted Types",
        examples: None,
        kind: PatternKind::BannedName,
        values: &[
            "/node_modules/safevalues/restricted/reviewed|htmlSafeByReview",
            "/node_modules/safevalues/restricted/reviewed|scriptSafeByReview",
            "/node_modules/safevalues/restricted/reviewed|scriptUrlSafeByReview",
        ],
        message: "Use of reviewed conversions to Trusted Types requires a security review.",
        trusted_type: None,
        trusted_argument: FIRST,
    },
];

/// Every built-in rule, ordered by id.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = Vec::with_capacity(PATTERNS.len() + 4);

    for pattern in PATTERNS {
        match pattern.build() {
            Ok(rule) => rules.push(Box::new(rule)),
            Err(e) => error!("Skipping built-in rule: {}", e),
        }
    }
    rules.push(Box::new(BanFunctionCalls::new()));
    rules.push(Box::new(BanDocumentExecCommand::new()));
    rules.push(Box::new(BanElementSetAttribute::new()));
    rules.push(Box::new(BanWindowStringFunctionDef::new()));

    rules.sort_by(|a, b| a.metadata().id.cmp(&b.metadata().id));
    rules
}

pub fn builtin_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for rule in builtin_rules() {
        registry.register(rule);
    }
    registry
}
