//! Configuration module for Roost

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::paths;

/// Cache engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Override for the database location (defaults to the data directory)
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Number of statuses to fetch per timeline page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hours before a cached status becomes eligible for pruning
    #[serde(default = "default_retention_hours")]
    pub cache_retention_hours: u64,

    /// Background refresh interval in seconds (0 = manual only)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_page_size() -> usize {
    50
}

fn default_retention_hours() -> u64 {
    72
}

fn default_refresh_interval() -> u64 {
    0 // Manual refresh by default
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            page_size: default_page_size(),
            cache_retention_hours: default_retention_hours(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load the config from the default location, falling back to defaults
    /// when no file exists yet
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_path(&path)
    }

    /// Load the config from a specific path
    pub fn load_path(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save the config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_path(&path)
    }

    /// Save the config to a specific path
    pub fn save_path(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }
}
