//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/hashnote/config.toml)
//! 3. Environment variables (HASHNOTE_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Identity of the notebook this process operates on
    #[serde(default = "default_notebook")]
    pub notebook: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            notebook: default_notebook(),
        }
    }
}

impl Config {
    /// Load configuration from the default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (HASHNOTE_DATA_DIR, HASHNOTE_NOTEBOOK)
    /// 2. Config file (~/.config/hashnote/config.toml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Path of the config file
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var("HASHNOTE_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hashnote")
            .join("config.toml")
    }

    /// Path of the SQLite database file
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("hashnote.db")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("HASHNOTE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(notebook) = std::env::var("HASHNOTE_NOTEBOOK") {
            self.notebook = notebook;
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hashnote")
}

fn default_notebook() -> String {
    "local".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.notebook, "local");
        assert!(config.sqlite_path().ends_with("hashnote.db"));
    }

    #[test]
    fn test_load_from_str() {
        let config = Config::load_from_str(
            r#"
            data_dir = "/tmp/hashnote-test"
            notebook = "alice"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/hashnote-test"));
        assert_eq!(config.notebook, "alice");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::load_from_str(r#"notebook = "bob""#).unwrap();
        assert_eq!(config.notebook, "bob");
        assert_eq!(config.data_dir, default_data_dir());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            data_dir: PathBuf::from("/tmp/hashnote-save"),
            notebook: "carol".to_string(),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.notebook, "carol");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            Config::load_from_path(&PathBuf::from("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.notebook, "local");
    }
}
