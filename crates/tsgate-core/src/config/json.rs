//! JSON documents read through the TypeScript parser.
//!
//! Exemption lists and `tsconfig.json` files are JSON with comments and
//! trailing commas. Parsing them as an expression accepts both and keeps the
//! position of every node for diagnostics.

use serde_json::{Map, Number, Value};
use swc_common::{SourceMap, Span};
use swc_ecma_ast::{ArrayLit, Expr, Lit, ObjectLit, Prop, PropName, PropOrSpread, UnaryOp};

use crate::parser::{ParseError, Parser};

pub struct JsonDocument {
    source_map: SourceMap,
    root: Option<Box<Expr>>,
    errors: Vec<ParseError>,
}

impl std::fmt::Debug for JsonDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDocument")
            .field("has_root", &self.root.is_some())
            .field("errors", &self.errors)
            .finish()
    }
}

impl JsonDocument {
    pub fn parse(path: &str, text: String) -> Self {
        let source_map = SourceMap::default();
        let output = Parser::new().parse_expression(&source_map, path, text);
        JsonDocument {
            source_map,
            root: output.node,
            errors: output.errors,
        }
    }

    pub fn root(&self) -> Option<&Expr> {
        self.root.as_deref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// One-based line and column of the start of `span`.
    pub fn position(&self, span: Span) -> (usize, usize) {
        let loc = self.source_map.lookup_char_pos(span.lo);
        (loc.line, loc.col_display + 1)
    }

    pub fn to_value(&self) -> Option<Value> {
        self.root().and_then(expr_to_value)
    }
}

/// Text of an object key written as a string literal.
pub fn string_key(name: &PropName) -> Option<String> {
    match name {
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// Converts a JSON-shaped expression. Anything JSON cannot express is `None`.
pub fn expr_to_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Object(object) => object_to_value(object),
        Expr::Array(array) => array_to_value(array),
        Expr::Lit(Lit::Str(s)) => Some(Value::String(s.value.to_string())),
        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Value::Null),
        Expr::Lit(Lit::Num(n)) => number(n.value),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
            Expr::Lit(Lit::Num(n)) => number(-n.value),
            _ => None,
        },
        Expr::Paren(paren) => expr_to_value(&paren.expr),
        _ => None,
    }
}

fn object_to_value(object: &ObjectLit) -> Option<Value> {
    let mut map = Map::new();
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            return None;
        };
        let Prop::KeyValue(kv) = &**prop else {
            return None;
        };
        let key = match &kv.key {
            PropName::Str(s) => s.value.to_string(),
            PropName::Ident(ident) => ident.sym.to_string(),
            _ => return None,
        };
        map.insert(key, expr_to_value(&kv.value)?);
    }
    Some(Value::Object(map))
}

fn array_to_value(array: &ArrayLit) -> Option<Value> {
    array
        .elems
        .iter()
        .map(|elem| match elem {
            Some(elem) if elem.spread.is_none() => expr_to_value(&elem.expr),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn number(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Some(Value::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_json_with_comments_and_trailing_commas() {
        let document = JsonDocument::parse(
            "tsconfig.json",
            r#"{
                // project settings
                "compilerOptions": {
                    "strict": true,
                    "target": "es2020",
                    "plugins": [{ "name": "tsgate", "exemptionConfig": "./exemptions.json" },],
                },
                "version": -2,
                "ratio": 0.5,
                "extends": null,
            }"#
            .to_string(),
        );

        assert!(document.errors().is_empty());
        assert_eq!(
            document.to_value(),
            Some(json!({
                "compilerOptions": {
                    "strict": true,
                    "target": "es2020",
                    "plugins": [{ "name": "tsgate", "exemptionConfig": "./exemptions.json" }]
                },
                "version": -2,
                "ratio": 0.5,
                "extends": null
            }))
        );
    }

    #[test]
    fn rejects_non_json_expressions() {
        let document = JsonDocument::parse("x.json", "{ \"a\": foo() }".to_string());

        assert!(document.root().is_some());
        assert_eq!(document.to_value(), None);
    }

    #[test]
    fn positions_are_one_based() {
        let document = JsonDocument::parse("x.json", "{\n  \"a\": 1\n}".to_string());
        let Some(Expr::Object(object)) = document.root() else {
            panic!("expected object");
        };
        let PropOrSpread::Prop(prop) = &object.props[0] else {
            panic!("expected property");
        };
        let Prop::KeyValue(kv) = &**prop else {
            panic!("expected key-value property");
        };
        let PropName::Str(key) = &kv.key else {
            panic!("expected string key");
        };

        assert_eq!(document.position(key.span), (2, 3));
    }

    #[test]
    fn reports_syntax_errors() {
        let document = JsonDocument::parse("x.json", "{ \"a\": [1, 2 }".to_string());

        assert!(!document.errors().is_empty());
    }
}
