//! Parser module for TypeScript/JavaScript source code
//!
//! Integrates with SWC for parsing source files into AST. All files of one
//! program are parsed into a shared [`SourceMap`] so that spans stay unique
//! across the whole program.

use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::Expr;
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax, parse_file_as_expr, parse_file_as_module};

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

/// Returns true for ambient declaration files (`.d.ts`, `.d.mts`, `.d.cts`).
pub fn is_declaration_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".d.ts") || lower.ends_with(".d.mts") || lower.ends_with(".d.cts")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub span_lo: u32,
    pub span_hi: u32,
    pub message: String,
}

impl ParseError {
    fn from_swc(source_map: &SourceMap, error: &swc_ecma_parser::error::Error) -> Self {
        let span = error.span();
        let loc = source_map.lookup_char_pos(span.lo);
        ParseError {
            line: loc.line,
            column: loc.col_display,
            span_lo: span.lo.0,
            span_hi: span.hi.0,
            message: error.kind().msg().to_string(),
        }
    }
}

/// Output of parsing one file into a shared source map.
#[derive(Debug)]
pub struct ParseOutput<T> {
    pub node: Option<T>,
    pub errors: Vec<ParseError>,
    pub start_pos: BytePos,
    pub end_pos: BytePos,
}

impl<T> ParseOutput<T> {
    pub fn is_ok(&self) -> bool {
        self.node.is_some()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
    decorators: bool,
    declaration: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn decorators(mut self, enabled: bool) -> Self {
        self.decorators = enabled;
        self
    }

    pub fn declaration(mut self, enabled: bool) -> Self {
        self.declaration = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                decorators: self.decorators,
                dts: self.declaration,
                no_early_errors: self.declaration,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self::builder().typescript(true).build()
    }

    pub fn for_file(filename: &str) -> Self {
        let declaration = is_declaration_file(filename);
        match detect_language(filename) {
            Language::JavaScript => Self::builder().build(),
            Language::TypeScript => Self::builder()
                .typescript(true)
                .decorators(true)
                .declaration(declaration)
                .build(),
            Language::Jsx => Self::builder().jsx(true).build(),
            Language::Tsx => Self::builder()
                .typescript(true)
                .jsx(true)
                .decorators(true)
                .build(),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    /// Parses `code` as a module, recovering from non-fatal errors.
    pub fn parse_module(
        &self,
        source_map: &SourceMap,
        filename: &str,
        code: String,
    ) -> ParseOutput<Module> {
        let fm = source_map.new_source_file(FileName::Real(filename.into()).into(), code);
        let mut recovered_errors = Vec::new();

        let result = parse_file_as_module(
            &fm,
            self.syntax,
            EsVersion::latest(),
            None,
            &mut recovered_errors,
        );

        let mut errors: Vec<ParseError> = recovered_errors
            .iter()
            .map(|e| ParseError::from_swc(source_map, e))
            .collect();

        let node = match result {
            Ok(module) => Some(module),
            Err(e) => {
                errors.push(ParseError::from_swc(source_map, &e));
                None
            }
        };

        ParseOutput {
            node,
            errors,
            start_pos: fm.start_pos,
            end_pos: fm.end_pos,
        }
    }

    /// Parses `code` as a single expression. Used for JSON documents.
    pub fn parse_expression(
        &self,
        source_map: &SourceMap,
        filename: &str,
        code: String,
    ) -> ParseOutput<Box<Expr>> {
        let fm = source_map.new_source_file(FileName::Real(filename.into()).into(), code);
        let mut recovered_errors = Vec::new();

        let result = parse_file_as_expr(
            &fm,
            self.syntax,
            EsVersion::latest(),
            None,
            &mut recovered_errors,
        );

        let mut errors: Vec<ParseError> = recovered_errors
            .iter()
            .map(|e| ParseError::from_swc(source_map, e))
            .collect();

        let node = match result {
            Ok(expr) => Some(expr),
            Err(e) => {
                errors.push(ParseError::from_swc(source_map, &e));
                None
            }
        };

        ParseOutput {
            node,
            errors,
            start_pos: fm.start_pos,
            end_pos: fm.end_pos,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
