//! Per-user configuration
//!
//! A small JSON file in the application directory. A missing file is the
//! normal first-run case and yields defaults; a malformed file logs a
//! warning and also falls back to defaults rather than aborting startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{app, server};

/// Per-user application directory (`~/.webdesk`)
pub fn app_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(app::DIR);
    path
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Port for the embedded server (0 = pick an ephemeral port)
    pub port: u16,

    /// Message rendered on the greeting page
    pub greeting: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 0,
            greeting: server::DEFAULT_GREETING.to_string(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        app_dir().join(app::CONFIG_FILE)
    }

    /// Load from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from a specific path, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Self::default();
        }

        match Self::read_from(path) {
            Ok(config) => {
                info!(path = %path.display(), port = config.port, "Loaded config");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = ?err, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    fn read_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .context(format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("webdesk-config-{}-{}.json", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 0);
        assert_eq!(config.greeting, "Hello World");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = env::temp_dir().join("webdesk-config-does-not-exist.json");
        let config = AppConfig::load_from(&path);
        assert_eq!(config.port, 0);
        assert_eq!(config.greeting, "Hello World");
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let path = temp_config("partial", r#"{"port": 8080}"#);
        let config = AppConfig::load_from(&path);
        assert_eq!(config.port, 8080);
        assert_eq!(config.greeting, "Hello World");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_full_file() {
        let path = temp_config("full", r#"{"port": 9000, "greeting": "Hi there"}"#);
        let config = AppConfig::load_from(&path);
        assert_eq!(config.port, 9000);
        assert_eq!(config.greeting, "Hi there");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let path = temp_config("malformed", "not json at all {");
        let config = AppConfig::load_from(&path);
        assert_eq!(config.port, 0);
        assert_eq!(config.greeting, "Hello World");
        let _ = fs::remove_file(&path);
    }
}
