//! Configuration loader and validator for the watcher.
//!
//! Only non-secret runtime settings live here; login and mail credentials
//! are a singleton database record collected on first run (see `setup`).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Runtime settings with cron-friendly defaults; a config file is optional
/// and may override any subset of fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub database_url: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://webdiplomacy.net/".to_string(),
            database_url: "sqlite://~/.dipwatch.db".to_string(),
            fetch_timeout_secs: 30,
            user_agent: concat!("dipwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults apply.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("base_url must be non-empty"));
    }
    if cfg.database_url.trim().is_empty() {
        return Err(ConfigError::Invalid("database_url must be non-empty"));
    }
    if cfg.fetch_timeout_secs == 0 {
        return Err(ConfigError::Invalid("fetch_timeout_secs must be > 0"));
    }
    if cfg.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("user_agent must be non-empty"));
    }
    Ok(())
}

/// Example YAML config, used in tests and as a starting point for users.
pub fn example() -> &'static str {
    r#"base_url: "https://webdiplomacy.net/"
database_url: "sqlite://~/.dipwatch.db"
fetch_timeout_secs: 30
user_agent: "dipwatch/0.1"
"#
}
