//! Per-rule allowlists of exempted files.
//!
//! A failure is exempted when its file path equals one of the listed paths or
//! matches one of the listed patterns.

use std::collections::HashSet;

use regex::bytes::Regex;
use serde::Deserialize;

use crate::resolution::normalize_path;

#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    #[error("Invalid allowlist pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllowlistReason {
    #[default]
    Unspecified,
    Legacy,
    OutOfScope,
    ManuallyReviewed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AllowlistEntry {
    pub reason: AllowlistReason,
    pub explanation: Option<String>,
    /// Exact file paths.
    pub path: Vec<String>,
    /// Regular expressions searched for in file paths.
    pub regexp: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    paths: HashSet<String>,
    patterns: Vec<Regex>,
}

impl Allowlist {
    pub fn new<'e>(
        entries: impl IntoIterator<Item = &'e AllowlistEntry>,
    ) -> Result<Self, AllowlistError> {
        let mut allowlist = Allowlist::default();
        for entry in entries {
            allowlist
                .paths
                .extend(entry.path.iter().map(|p| normalize_path(p)));
            for pattern in &entry.regexp {
                let regex = Regex::new(pattern).map_err(|source| AllowlistError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                allowlist.patterns.push(regex);
            }
        }
        Ok(allowlist)
    }

    pub fn add_path(&mut self, path: &str) {
        self.paths.insert(normalize_path(path));
    }

    pub fn add_pattern(&mut self, pattern: Regex) {
        self.patterns.push(pattern);
    }

    pub fn merge(&mut self, other: &Allowlist) {
        self.paths.extend(other.paths.iter().cloned());
        self.patterns.extend(other.patterns.iter().cloned());
    }

    pub fn is_allowlisted(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.paths.contains(&path) || self.patterns.iter().any(|p| p.is_match(path.as_bytes()))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.patterns.is_empty()
    }
}
