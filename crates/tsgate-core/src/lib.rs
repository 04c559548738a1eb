//! tsgate core - Trusted Types conformance checks for TypeScript
//!
//! A [`checker::Checker`] walks each file once and dispatches to the handlers
//! rules registered with it. Rules find banned DOM and JavaScript APIs with
//! the [`matchers`], backed by the type resolution in [`semantic`], and skip
//! files exempted by an [`allowlist::Allowlist`]. [`analysis::AnalysisEngine`]
//! ties the registry, configuration and exemptions together for callers.

pub mod allowlist;
pub mod analysis;
pub mod checker;
pub mod config;
pub mod diagnostic;
pub mod failure;
pub mod matchers;
pub mod parser;
pub mod program;
pub mod resolution;
pub mod rules;
pub mod semantic;
