//! Configuration loading and database path resolution
//!
//! Bootstrap configuration comes from a TOML file. Every field has a
//! compiled default, so a missing file never stops startup.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--database`, `--narrator-url`)
//! 2. Environment variables (`DEALSCOPE_DATABASE`, `DEALSCOPE_NARRATOR_URL`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{EngineParams, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the database path
pub const DATABASE_ENV_VAR: &str = "DEALSCOPE_DATABASE";

/// Environment variable overriding the narrator endpoint
pub const NARRATOR_ENV_VAR: &str = "DEALSCOPE_NARRATOR_URL";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database holding meeting records
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Engine policy parameters (optional, per-field defaults)
    #[serde(default)]
    pub engine: EngineParams,

    /// Insight narrator endpoint (optional)
    #[serde(default)]
    pub narrator: NarratorConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Narrator endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarratorConfig {
    /// URL the narrative payload is POSTed to; narration is disabled when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_narrator_timeout")]
    pub timeout_secs: u64,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_narrator_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_narrator_timeout() -> u64 {
    30
}

impl TomlConfig {
    /// Parse configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or from the platform default location
    ///
    /// A missing file yields defaults with a warning. A file that exists but
    /// does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    warn!("Could not determine config directory, using built-in defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            warn!("Config file not found: {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the database path (CLI > env > TOML > default)
    pub fn resolve_database_path(&self, cli_arg: Option<&Path>) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        default_database_path()
    }

    /// Resolve the narrator endpoint (CLI > env > TOML); `None` disables narration
    pub fn resolve_narrator_endpoint(&self, cli_arg: Option<&str>) -> Option<String> {
        if let Some(url) = cli_arg {
            return Some(url.to_string());
        }

        if let Ok(url) = std::env::var(NARRATOR_ENV_VAR) {
            if !url.trim().is_empty() {
                return Some(url);
            }
        }

        self.narrator
            .endpoint
            .clone()
            .filter(|url| !url.trim().is_empty())
    }
}

/// Platform config file location (`<config_dir>/dealscope/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dealscope").join("config.toml"))
}

/// Platform default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dealscope").join("dealscope.db"))
        .unwrap_or_else(|| PathBuf::from("./dealscope_data/dealscope.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.database_path.is_none());
        assert_eq!(config.narrator.timeout_secs, 30);
        assert_eq!(config.engine, EngineParams::default());
    }

    #[test]
    fn test_invalid_engine_params_rejected() {
        let result = TomlConfig::from_toml_str("[engine]\npercentile_low = 0.9\npercentile_high = 0.1\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("database_path = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_database_path_wins() {
        let config = TomlConfig {
            database_path: Some(PathBuf::from("/from/toml.db")),
            ..TomlConfig::default()
        };
        let resolved = config.resolve_database_path(Some(Path::new("/from/cli.db")));
        assert_eq!(resolved, PathBuf::from("/from/cli.db"));
    }

    #[test]
    fn test_default_database_path_is_not_empty() {
        assert!(!default_database_path().as_os_str().is_empty());
    }
}
