use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::ClientConfig;

/// Shipped defaults, written by `clb config init`
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Error type for config and session I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("could not encode session: {0}")]
    SessionEncode(#[from] serde_json::Error),
}

/// Client config directory, respecting XDG_CONFIG_HOME
pub fn default_config_dir() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".config"));
    config_dir.join("collabify")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.toml")
}

/// Read the config. A missing file yields the defaults.
pub fn read_config(config_dir: &Path) -> Result<ClientConfig, ConfigError> {
    let path = config_path(config_dir);
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Read the config as a toml_edit document for round-trip-safe editing.
/// Starts from the template if no file exists yet.
pub fn read_config_doc(config_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let path = config_path(config_dir);
    let text = if path.exists() {
        fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?
    } else {
        CONFIG_TEMPLATE.to_string()
    };
    Ok(text.parse()?)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config_doc(config_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(config_dir);
    fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
        path: config_dir.to_path_buf(),
        source: e,
    })?;
    fs::write(&path, doc.to_string()).map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Set a dotted key (`api.base_url`, `ui.column_width`, ...) in the document.
/// Values are type-checked against the config schema before being written.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    let (table, field) = key
        .split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

    let item = match key {
        "api.base_url" => {
            let trimmed = value.trim().trim_end_matches('/');
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(invalid());
            }
            toml_edit::value(trimmed)
        }
        "api.timeout_secs" | "ui.column_width" => {
            let n: i64 = value.trim().parse().map_err(|_| invalid())?;
            if n <= 0 {
                return Err(invalid());
            }
            toml_edit::value(n)
        }
        "ui.show_ids" => toml_edit::value(value.trim().parse::<bool>().map_err(|_| invalid())?),
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    };

    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[table][field] = item;
    Ok(())
}
