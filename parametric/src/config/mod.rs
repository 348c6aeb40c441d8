//! Configuration management
//!
//! Default config location: ~/.parametric/config.toml

use crate::error::{Error, Result};
use crate::request::SortOrder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Values returned per field when a request does not say
    #[serde(default = "default_max_values")]
    pub default_max_values: usize,

    #[serde(default)]
    pub default_sort: SortOrder,

    /// Default field set. Empty means every field found in the documents.
    #[serde(default)]
    pub parametric_fields: Vec<String>,

    /// JSON document set served by the in-memory gateway
    #[serde(default)]
    pub documents: Option<PathBuf>,
}

fn default_max_values() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_values: default_max_values(),
            default_sort: SortOrder::default(),
            parametric_fields: Vec::new(),
            documents: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of memoized bucket results (LRU eviction)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_entries: default_max_entries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter
    /// Override with RUST_LOG env var
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_level() -> String {
    "info,parametric=debug".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

/// Default config file path
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parametric")
        .join("config.toml")
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.validate()?;
        config.expand_paths()?;
        Ok(config)
    }

    /// Load config from file path, or create default
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            Self::from_toml_str(&content)
        } else {
            let config = Config::default();
            // An unwritable location still yields a usable default.
            if let Err(e) = config.save(config_path) {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Failed to write default config"
                );
            }
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(Error::Config("cache.max_entries must be at least 1".to_string()));
        }
        match self.observability.log_format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(Error::Config(format!(
                "observability.log_format must be \"pretty\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }

    fn expand_paths(&mut self) -> Result<()> {
        if let Some(ref docs) = self.engine.documents {
            self.engine.documents = Some(expand_tilde(docs)?);
        }
        Ok(())
    }
}
