//! Configuration loading and dataset path resolution
//!
//! Paths are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PUNNYLAND_DATASET`)
//! 3. TOML config file (`<config_dir>/punnyland/config.toml`)
//! 4. Compiled default (fallback)

use crate::fsutil::write_atomic;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the dataset path
pub const DATASET_ENV_VAR: &str = "PUNNYLAND_DATASET";

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "PUNNYLAND_CONFIG";

/// Dataset path used when nothing else is configured
pub const DEFAULT_DATASET_PATH: &str = "data/jokes.json";

/// Profile file name inside the profile directory
pub const PROFILE_FILE_NAME: &str = "user_data.json";

/// Configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to the joke dataset (relative or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<PathBuf>,

    /// Directory holding the user profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,

    /// Rule table overrides for the curation tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default config file path for the platform
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|d| d.join("punnyland").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Default profile directory (`~/.punnyland`)
pub fn default_profile_dir() -> PathBuf {
    dirs::home_dir()
        .map(|d| d.join(".punnyland"))
        .unwrap_or_else(|| PathBuf::from(".punnyland"))
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load the config at the default location; missing or unreadable files
/// yield the defaults
pub fn load_default_config() -> TomlConfig {
    let Ok(path) = default_config_path() else {
        return TomlConfig::default();
    };
    if !path.exists() {
        return TomlConfig::default();
    }
    match load_toml_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Write a TOML config file atomically
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    write_atomic(path, content.as_bytes())
}

/// Resolve the dataset path in priority order (CLI, env, TOML, default)
pub fn resolve_dataset_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(DATASET_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(path) = &config.dataset_path {
        return path.clone();
    }
    PathBuf::from(DEFAULT_DATASET_PATH)
}

/// Resolve the profile directory (CLI, TOML, `~/.punnyland`)
pub fn resolve_profile_dir(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    cli_arg
        .map(Path::to_path_buf)
        .or_else(|| config.profile_dir.clone())
        .unwrap_or_else(default_profile_dir)
}

/// Resolve the rule table path (CLI, TOML); `None` means built-in rules
pub fn resolve_rules_path(cli_arg: Option<&Path>, config: &TomlConfig) -> Option<PathBuf> {
    cli_arg
        .map(Path::to_path_buf)
        .or_else(|| config.rules_path.clone())
}
