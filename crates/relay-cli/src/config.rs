//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to request from the provider
    pub model: Option<String>,
    /// Provider base URL (for proxies or compatible servers)
    pub base_url: Option<String>,
    /// API key (alternative to environment variables)
    pub api_key: Option<String>,
    /// Directory for session checkpoints
    pub store_dir: Option<String>,
    /// Directory of text documents searchable by the doc_search tool
    pub docs_dir: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relay")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for RELAY_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("RELAY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Get the API key, checking config then env
    pub fn api_key(&self) -> Option<String> {
        if self.api_key.is_some() {
            return self.api_key.clone();
        }
        std::env::var("RELAY_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
    }

    /// Directory where session checkpoints are written
    pub fn store_dir(&self) -> PathBuf {
        match &self.store_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("relay")
                .join("sessions"),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# relay configuration file
# Place at ~/.config/relay/config.toml (Linux/Mac) or %APPDATA%\relay\config.toml (Windows)

# Model to request from the provider
model = "gpt-4o-mini"

# Provider base URL (optional, for proxies or compatible servers)
# base_url = "https://api.openai.com/v1"

# API key (optional - RELAY_API_KEY or OPENAI_API_KEY env vars also work)
# It's recommended to use environment variables instead for security
# api_key = "sk-..."

# Directory for session checkpoints (optional)
# store_dir = "~/.local/share/relay/sessions"

# Directory of text documents searchable by the doc_search tool (optional)
# docs_dir = "./docs"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let config: Config = toml::from_str("model = \"m\"\nextra = 1\n").unwrap();
        assert_eq!(config.model.as_deref(), Some("m"));
    }
}
