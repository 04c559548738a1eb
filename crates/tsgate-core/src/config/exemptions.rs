//! Exemption lists: per-rule files that may violate the rule.
//!
//! The exemption file is a JSON object mapping rule names to arrays of paths
//! or glob patterns, both relative to the file's own directory:
//!
//! ```json
//! {
//!   "ban-eval-calls": ["src/legacy/*.ts", "tools/repl.ts"]
//! }
//! ```
//!
//! Malformed entries never fail the load. Each one becomes an
//! [`ExemptionDiagnostic`] at its position and is skipped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use regex::bytes::Regex;
use serde_json::Value;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{Expr, Lit, Prop, PropOrSpread};
use tracing::{debug, warn};

use super::json::{JsonDocument, string_key};
use crate::allowlist::Allowlist;
use crate::resolution::{join_path, normalize_path, parent_dir};

const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, thiserror::Error)]
pub enum ExemptionError {
    #[error("Failed to read exemption config '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A malformed part of an exemption file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptionDiagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Default)]
pub struct ParsedExemptions {
    pub list: ExemptionList,
    pub diagnostics: Vec<ExemptionDiagnostic>,
}

/// Exempted files per rule name. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct ExemptionList {
    entries: BTreeMap<String, Vec<String>>,
    allowlists: HashMap<String, Allowlist>,
    positions: HashMap<String, (usize, usize)>,
}

impl ExemptionList {
    /// Entries as written in the file, keyed by rule name.
    pub fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entries
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn allowlist_for(&self, rule_name: &str) -> Option<&Allowlist> {
        self.allowlists.get(rule_name)
    }

    pub fn is_exempted(&self, rule_name: &str, path: &str) -> bool {
        self.allowlist_for(rule_name)
            .is_some_and(|allowlist| allowlist.is_allowlisted(path))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Warnings for rule names no registered rule owns.
    pub fn unknown_rules(&self, is_known: impl Fn(&str) -> bool) -> Vec<ExemptionDiagnostic> {
        self.entries
            .keys()
            .filter(|name| !is_known(name))
            .map(|name| {
                let (line, column) = self.positions.get(name).copied().unwrap_or((1, 1));
                ExemptionDiagnostic {
                    message: format!("Unknown rule '{}' in exemption config", name),
                    line,
                    column,
                }
            })
            .collect()
    }

    /// The list as a JSON object, in the shape it was read from.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(rule, paths)| {
                    let paths = paths.iter().cloned().map(Value::String).collect();
                    (rule.clone(), Value::Array(paths))
                })
                .collect(),
        )
    }
}

pub fn load_exemption_config(path: &Path) -> Result<ParsedExemptions, ExemptionError> {
    let text = std::fs::read_to_string(path).map_err(|e| ExemptionError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parse_exemption_config(&path.to_string_lossy(), text))
}

/// Parses the exemption file at `path`. Relative entries resolve against the
/// directory of `path`.
pub fn parse_exemption_config(path: &str, text: String) -> ParsedExemptions {
    let document = JsonDocument::parse(path, text);
    let base_dir = parent_dir(&normalize_path(path)).to_string();
    let mut parser = ExemptionParser {
        document: &document,
        base_dir,
        list: ExemptionList::default(),
        diagnostics: Vec::new(),
    };

    for error in document.errors() {
        parser.diagnostics.push(ExemptionDiagnostic {
            message: format!("Invalid exemption config: {}", error.message),
            line: error.line,
            column: error.column + 1,
        });
    }

    match document.root() {
        Some(Expr::Object(object)) => {
            for prop in &object.props {
                parser.parse_prop(prop);
            }
        }
        Some(other) => parser.report(
            other.span(),
            "Exemption config must be an object mapping rule names to paths".to_string(),
        ),
        None => {}
    }

    for diagnostic in &parser.diagnostics {
        warn!(
            path,
            line = diagnostic.line,
            column = diagnostic.column,
            "{}",
            diagnostic.message
        );
    }
    debug!(path, rules = parser.list.entries.len(), "exemption config parsed");

    ParsedExemptions {
        list: parser.list,
        diagnostics: parser.diagnostics,
    }
}

struct ExemptionParser<'d> {
    document: &'d JsonDocument,
    base_dir: String,
    list: ExemptionList,
    diagnostics: Vec<ExemptionDiagnostic>,
}

impl ExemptionParser<'_> {
    fn report(&mut self, span: Span, message: String) {
        let (line, column) = self.document.position(span);
        self.diagnostics.push(ExemptionDiagnostic {
            message,
            line,
            column,
        });
    }

    fn parse_prop(&mut self, prop: &PropOrSpread) {
        let PropOrSpread::Prop(prop) = prop else {
            self.report(prop.span(), "Unexpected spread in exemption config".to_string());
            return;
        };
        let Prop::KeyValue(kv) = &**prop else {
            self.report(
                prop.span(),
                "Exemption config entries must be \"rule-name\": [paths]".to_string(),
            );
            return;
        };
        let Some(rule) = string_key(&kv.key) else {
            self.report(
                kv.key.span(),
                "Exemption config keys must be string literals".to_string(),
            );
            return;
        };
        let Expr::Array(array) = &*kv.value else {
            self.report(
                kv.value.span(),
                format!("Exemptions for '{}' must be an array of strings", rule),
            );
            return;
        };

        let position = self.document.position(kv.key.span());
        self.list.positions.entry(rule.clone()).or_insert(position);
        self.list.entries.entry(rule.clone()).or_default();

        for elem in array.elems.iter().flatten() {
            match &*elem.expr {
                Expr::Lit(Lit::Str(s)) if elem.spread.is_none() => {
                    let value = s.value.to_string();
                    if let Err(message) = self.add_entry(&rule, &value) {
                        self.report(s.span, message);
                        continue;
                    }
                    if let Some(entries) = self.list.entries.get_mut(&rule) {
                        entries.push(value);
                    }
                }
                other => self.report(
                    other.span(),
                    format!("Exemption for '{}' must be a string", rule),
                ),
            }
        }
    }

    fn add_entry(&mut self, rule: &str, value: &str) -> Result<(), String> {
        let allowlist = self.list.allowlists.entry(rule.to_string()).or_default();

        if value.contains(GLOB_CHARS) {
            // Only the entry itself is a glob; the directory is matched literally.
            let pattern = join_path(&globset::escape(&self.base_dir), value);
            allowlist.add_pattern(glob_regex(&pattern)?);
        } else {
            allowlist.add_path(&join_path(&self.base_dir, value));
        }
        Ok(())
    }
}

fn glob_regex(pattern: &str) -> Result<Regex, String> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| format!("Invalid glob '{}': {}", pattern, e))?;
    Regex::new(glob.regex()).map_err(|e| format!("Invalid glob '{}': {}", pattern, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn parse(text: &str) -> ParsedExemptions {
        parse_exemption_config("/repo/exemptions.json", text.to_string())
    }

    #[test]
    fn literal_paths_resolve_against_config_directory() {
        let parsed = parse(r#"{ "ban-eval-calls": ["src/repl.ts", "./tools/../tools/a.ts"] }"#);

        assert!(parsed.diagnostics.is_empty());
        assert!(parsed.list.is_exempted("ban-eval-calls", "/repo/src/repl.ts"));
        assert!(parsed.list.is_exempted("ban-eval-calls", "/repo/tools/a.ts"));
        assert!(!parsed.list.is_exempted("ban-eval-calls", "/repo/src/app.ts"));
        assert!(!parsed.list.is_exempted("ban-worker-calls", "/repo/src/repl.ts"));
    }

    #[test]
    fn globs_compile_to_patterns() {
        let parsed = parse(r#"{ "ban-eval-calls": ["src/legacy/*.ts", "gen/**/*.ts"] }"#);

        let list = &parsed.list;
        assert!(list.is_exempted("ban-eval-calls", "/repo/src/legacy/x.ts"));
        assert!(!list.is_exempted("ban-eval-calls", "/repo/src/legacy/deep/x.ts"));
        assert!(list.is_exempted("ban-eval-calls", "/repo/gen/a/b/c.ts"));
        assert!(!list.is_exempted("ban-eval-calls", "/other/src/legacy/x.ts"));
    }

    #[test]
    fn glob_metacharacters_in_the_config_directory_are_literal() {
        let parsed = parse_exemption_config(
            "/work/[ci] {1}/exemptions.json",
            r#"{ "ban-eval-calls": ["src/*.ts", "../shared/**/*.ts"] }"#.to_string(),
        );

        let list = &parsed.list;
        assert!(parsed.diagnostics.is_empty());
        assert!(list.is_exempted("ban-eval-calls", "/work/[ci] {1}/src/a.ts"));
        assert!(list.is_exempted("ban-eval-calls", "/work/shared/x/y.ts"));
        assert!(!list.is_exempted("ban-eval-calls", "/work/c 1/src/a.ts"));
    }

    #[test]
    fn malformed_entries_are_reported_and_skipped() {
        let parsed = parse(
            r#"{
  "ban-eval-calls": ["src/a.ts", 42],
  "ban-worker-calls": "src/b.ts",
  unquoted: ["src/c.ts"],
  "ban-document-write-calls": ["src/[bad.ts"],
  "ban-base-href-assignments": ["src/d.ts"]
}"#,
        );

        let lines: Vec<usize> = parsed.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5], "{:?}", parsed.diagnostics);
        assert!(parsed.diagnostics[0].message.contains("must be a string"));
        assert!(parsed.diagnostics[1].message.contains("must be an array"));
        assert!(parsed.diagnostics[2].message.contains("string literals"));
        assert!(parsed.diagnostics[3].message.contains("Invalid glob"));

        assert!(parsed.list.is_exempted("ban-eval-calls", "/repo/src/a.ts"));
        assert!(parsed.list.is_exempted("ban-base-href-assignments", "/repo/src/d.ts"));
        assert!(parsed.list.allowlist_for("ban-worker-calls").is_none());
    }

    #[test]
    fn non_object_root_yields_empty_list() {
        let parsed = parse(r#"["src/a.ts"]"#);

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!((parsed.diagnostics[0].line, parsed.diagnostics[0].column), (1, 1));
        assert!(parsed.list.is_empty());
    }

    #[test]
    fn syntax_errors_are_diagnostics() {
        let parsed = parse(r#"{ "ban-eval-calls": ["src/a.ts" "#);

        assert!(!parsed.diagnostics.is_empty());
        assert!(parsed.diagnostics[0].message.starts_with("Invalid exemption config"));
    }

    #[test]
    fn entries_round_trip_through_json() {
        let parsed = parse(
            r#"{
  "ban-eval-calls": ["src/legacy/*.ts", "tools/repl.ts"],
  "ban-element-innerhtml-assignments": ["src/render.ts"]
}"#,
        );

        let text = serde_json::to_string(&parsed.list.to_json()).unwrap();
        let reparsed = parse(&text);

        assert_eq!(reparsed.list.entries().len(), parsed.list.entries().len());
        for (rule, paths) in parsed.list.entries() {
            let original: HashSet<_> = paths.iter().collect();
            let round_tripped: HashSet<_> = reparsed.list.entries()[rule].iter().collect();
            assert_eq!(original, round_tripped, "paths of {}", rule);
        }
    }

    #[test]
    fn unknown_rule_names_are_reported_at_their_key() {
        let parsed = parse("{\n  \"ban-eval-calls\": [],\n  \"ban-evil-calls\": []\n}");

        let warnings = parsed.list.unknown_rules(|name| name == "ban-eval-calls");

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("ban-evil-calls"));
        assert_eq!((warnings[0].line, warnings[0].column), (3, 3));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("exemptions.json");
        std::fs::write(&path, r#"{ "ban-eval-calls": ["a.ts"] }"#).unwrap();

        let parsed = load_exemption_config(&path).unwrap();
        let exempted = dir.path().join("a.ts");

        assert!(parsed.diagnostics.is_empty());
        assert!(
            parsed
                .list
                .is_exempted("ban-eval-calls", &exempted.to_string_lossy())
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let result = load_exemption_config(&dir.path().join("missing.json"));

        assert!(matches!(result, Err(ExemptionError::ReadError { .. })));
    }
}
