//! User configuration
//!
//! Configuration is stored in `~/.config/supercmd/config.toml` (or the
//! platform equivalent). `SUPERCMD_CONFIG` points at a different file and
//! `SUPERCMD_ALIASES` at a different alias file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Overrides the configuration file location
pub const CONFIG_ENV: &str = "SUPERCMD_CONFIG";

/// Overrides the user alias file location
pub const ALIASES_ENV: &str = "SUPERCMD_ALIASES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Output format used when `--format` is not given
    pub default_format: Option<String>,

    /// Location of the user alias file
    pub aliases_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from the default location, or from
    /// `SUPERCMD_CONFIG` if set. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            trace!(path = %path.display(), "no configuration file");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(format) = &self.default_format {
            if format.trim().is_empty() {
                return Err(ConfigError::Invalid("default_format must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Returns the user config directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "supercmd", "supercmd").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the configuration file that [`Config::load`] reads
    pub fn config_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => Self::config_dir().map(|dir| dir.join("config.toml")),
        }
    }

    /// Returns the user alias file: `SUPERCMD_ALIASES`, then the configured
    /// file, then `aliases` in the config directory.
    pub fn aliases_file(&self) -> Option<PathBuf> {
        match std::env::var_os(ALIASES_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => self
                .aliases_file
                .clone()
                .or_else(|| Self::config_dir().map(|dir| dir.join("aliases"))),
        }
    }
}
