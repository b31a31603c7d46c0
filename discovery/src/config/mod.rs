//! Configuration management
//!
//! Default config location: ~/.discovery/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregations::{AggregationDecoder, UnknownTypePolicy};

/// Environment variable overriding `decoding.unknown_types`
pub const UNKNOWN_TYPES_ENV: &str = "DISCOVERY_UNKNOWN_TYPES";

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub decoding: DecodingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct DecodingConfig {
    /// "lenient" keeps unknown aggregation types as generic values,
    /// "strict" rejects them
    #[serde(default)]
    pub unknown_types: UnknownTypePolicy,
}

impl DecodingConfig {
    pub fn decoder(&self) -> AggregationDecoder {
        AggregationDecoder::new(self.unknown_types)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    /// Log output format: "pretty" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

/// Default config file path (~/.discovery/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".discovery")
        .join("config.toml")
}

impl Config {
    /// Load config from default location (~/.discovery/config.toml)
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load config from a file path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Config::default()
        };
        Ok(config)
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

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; invalid values are logged and ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(UNKNOWN_TYPES_ENV) {
            match raw.parse::<UnknownTypePolicy>() {
                Ok(policy) => self.decoding.unknown_types = policy,
                Err(e) => tracing::warn!("Ignoring {}: {}", UNKNOWN_TYPES_ENV, e),
            }
        }
    }

    /// Decoder configured by this config
    pub fn decoder(&self) -> AggregationDecoder {
        self.decoding.decoder()
    }
}
