//! Exemption list discovery through `tsconfig.json`.
//!
//! A project names its exemption list in the options of the `tsgate` compiler
//! plugin:
//!
//! ```json
//! { "compilerOptions": { "plugins": [{ "name": "tsgate", "exemptionConfig": "./exemptions.json" }] } }
//! ```
//!
//! The option is looked up in the tsconfig itself, then in the tsconfig it
//! `extends` (one level). The path is relative to the file declaring it.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::json::JsonDocument;

pub const TSCONFIG_FILENAME: &str = "tsconfig.json";
pub const PLUGIN_NAME: &str = "tsgate";
pub const EXEMPTION_OPTION: &str = "exemptionConfig";

#[derive(Debug, thiserror::Error)]
pub enum TsconfigError {
    #[error("Failed to read tsconfig '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

pub fn find_tsconfig(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(TSCONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn read_tsconfig(path: &Path) -> Result<Value, TsconfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| TsconfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let document = JsonDocument::parse(&path.to_string_lossy(), text);
    if let Some(error) = document.errors().first() {
        return Err(TsconfigError::ParseError {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }
    document.to_value().ok_or_else(|| TsconfigError::ParseError {
        path: path.to_path_buf(),
        message: "not a JSON document".to_string(),
    })
}

/// Exemption list path configured for the project of `tsconfig`.
pub fn exemption_config_path(tsconfig: &Path) -> Result<Option<PathBuf>, TsconfigError> {
    let config = read_tsconfig(tsconfig)?;
    let dir = tsconfig.parent().unwrap_or(Path::new(""));

    if let Some(option) = plugin_option(&config) {
        debug!(tsconfig = %tsconfig.display(), option, "exemption config from tsconfig");
        return Ok(Some(dir.join(option)));
    }

    let Some(extends) = config.get("extends").and_then(Value::as_str) else {
        return Ok(None);
    };
    let parent = extended_path(dir, extends);
    match read_tsconfig(&parent) {
        Ok(parent_config) => {
            let parent_dir = parent.parent().unwrap_or(Path::new(""));
            Ok(plugin_option(&parent_config).map(|option| {
                debug!(tsconfig = %parent.display(), option, "exemption config from extended tsconfig");
                parent_dir.join(option)
            }))
        }
        Err(e) => {
            warn!("Ignoring extended tsconfig: {}", e);
            Ok(None)
        }
    }
}

fn plugin_option(config: &Value) -> Option<&str> {
    config
        .get("compilerOptions")?
        .get("plugins")?
        .as_array()?
        .iter()
        .find(|plugin| plugin.get("name").and_then(Value::as_str) == Some(PLUGIN_NAME))?
        .get(EXEMPTION_OPTION)?
        .as_str()
}

fn extended_path(dir: &Path, extends: &str) -> PathBuf {
    let path = if extends.starts_with('.') || Path::new(extends).is_absolute() {
        dir.join(extends)
    } else {
        dir.join("node_modules").join(extends)
    };
    if path.extension().is_some_and(|ext| ext == "json") {
        return path;
    }
    let mut with_json = path.into_os_string();
    with_json.push(".json");
    PathBuf::from(with_json)
}
