//! Configuration loading and parsing for tsgate
//!
//! Provides functionality to load and parse `tsgate.toml` configuration files,
//! plus the JSON documents tsgate reads next to a TypeScript project: the
//! exemption list and `tsconfig.json`.

pub mod exemptions;
pub mod json;
pub mod tsconfig;

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::allowlist::AllowlistEntry;
use crate::rules::{Confidence, Severity};

pub const CONFIG_FILENAME: &str = "tsgate.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "include",
    "exclude",
    "rules",
    "trusted_types",
    "exemptions",
    "custom_rules",
];
const KNOWN_RULES_KEYS: &[&str] = &["disabled", "severity", "min_confidence"];
const KNOWN_TRUSTED_TYPES_KEYS: &[&str] = &["allow_ambient", "module_paths"];
const KNOWN_EXEMPTIONS_KEYS: &[&str] = &["config"];
const KNOWN_CUSTOM_RULE_KEYS: &[&str] = &[
    "name",
    "kind",
    "values",
    "message",
    "allowed_trusted_type",
    "suggestion",
    "allowlist",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub rules: RulesConfig,
    pub trusted_types: TrustedTypesConfig,
    pub exemptions: ExemptionsConfig,
    pub custom_rules: Vec<CustomRuleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub disabled: Vec<String>,
    #[serde(default)]
    pub severity: HashMap<String, SeverityValue>,
    pub min_confidence: Option<ConfidenceValue>,
}

/// Where values of the allowed Trusted Types may be declared.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrustedTypesConfig {
    /// Accept Trusted Types declared globally, as the bundled library does.
    pub allow_ambient: bool,
    /// Accept Trusted Types declared in files whose path contains one of these.
    pub module_paths: Vec<String>,
}

impl Default for TrustedTypesConfig {
    fn default() -> Self {
        Self {
            allow_ambient: true,
            module_paths: vec![
                "/node_modules/safevalues/".to_string(),
                "/node_modules/@types/trusted-types/".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExemptionsConfig {
    /// Exemption list path, relative to the directory holding `tsgate.toml`.
    pub config: Option<PathBuf>,
}

/// A user-defined conformance pattern.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CustomRuleConfig {
    pub name: String,
    pub kind: PatternKindValue,
    pub values: Vec<String>,
    pub message: String,
    #[serde(default)]
    pub allowed_trusted_type: Option<String>,
    /// Shown with every failure. Defaults to the policy call producing the
    /// allowed Trusted Type.
    #[serde(default)]
    pub suggestion: Option<String>,
    /// Files exempted from this rule alone.
    #[serde(default)]
    pub allowlist: Vec<AllowlistEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKindValue {
    BannedName,
    BannedProperty,
    BannedPropertyWrite,
    BannedImportedName,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityValue {
    Error,
    Warning,
    Info,
    Hint,
}

impl From<SeverityValue> for Severity {
    fn from(value: SeverityValue) -> Self {
        match value {
            SeverityValue::Error => Severity::Error,
            SeverityValue::Warning => Severity::Warning,
            SeverityValue::Info => Severity::Info,
            SeverityValue::Hint => Severity::Hint,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceValue {
    High,
    Medium,
    Low,
}

impl From<ConfidenceValue> for Confidence {
    fn from(value: ConfidenceValue) -> Self {
        match value {
            ConfidenceValue::High => Confidence::High,
            ConfidenceValue::Medium => Confidence::Medium,
            ConfidenceValue::Low => Confidence::Low,
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [
        ("rules", KNOWN_RULES_KEYS),
        ("trusted_types", KNOWN_TRUSTED_TYPES_KEYS),
        ("exemptions", KNOWN_EXEMPTIONS_KEYS),
    ] {
        if let Some(toml::Value::Table(values)) = table.get(section) {
            for key in values.keys() {
                if !known.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    if let Some(toml::Value::Array(rules)) = table.get("custom_rules") {
        for rule in rules.iter().filter_map(toml::Value::as_table) {
            for key in rule.keys() {
                if !KNOWN_CUSTOM_RULE_KEYS.contains(&key.as_str()) {
                    warnings.push(format!(
                        "Unknown config option in [[custom_rules]]: '{}'",
                        key
                    ));
                }
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path).unwrap_or_default(),
        None => ConfigResult::default(),
    }
}
