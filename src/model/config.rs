use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend root, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Default: see src/templates/config.toml
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Default: see src/templates/config.toml
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Width of each board column in terminal cells
    #[serde(default = "default_column_width")]
    pub column_width: usize,
    /// Prefix task and comment lines with their backend ids
    #[serde(default = "default_true")]
    pub show_ids: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            column_width: default_column_width(),
            show_ids: true,
        }
    }
}

fn default_column_width() -> usize {
    28
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.ui.column_width, 28);
        assert!(config.ui.show_ids);
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"[api]
base_url = "https://pm.example.com"

[ui]
show_ids = false
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://pm.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(!config.ui.show_ids);
        assert_eq!(config.ui.column_width, 28);
    }
}
