//! Configuration management for tvguide
//!
//! Handles config file loading/saving and endpoint resolution.
//! Config is stored at ~/.config/tvguide/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::CLOCK_PERIOD;

/// Environment variable overriding the channels endpoint
pub const CHANNELS_URL_ENV: &str = "TVGUIDE_CHANNELS_URL";
/// Environment variable overriding the EPG endpoint
pub const EPG_URL_ENV: &str = "TVGUIDE_EPG_URL";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Channel catalog endpoint
    pub channels_url: Option<String>,
    /// Program guide endpoint (optional)
    pub epg_url: Option<String>,
    /// Where the starred collection is persisted
    pub storage_path: Option<PathBuf>,
    /// Clock refresh period in seconds (default 1)
    pub clock_interval_secs: Option<u64>,
}

impl Config {
    /// Get config file path (~/.config/tvguide/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tvguide").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path; a missing or invalid file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Apply endpoint overrides from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(CHANNELS_URL_ENV).ok(),
            std::env::var(EPG_URL_ENV).ok(),
        );
    }

    /// Replace endpoints with any explicitly given values
    pub fn apply_overrides(&mut self, channels_url: Option<String>, epg_url: Option<String>) {
        if channels_url.is_some() {
            self.channels_url = channels_url;
        }
        if epg_url.is_some() {
            self.epg_url = epg_url;
        }
    }

    /// Storage file location, falling back to the data directory
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(crate::storage::FileStorage::default_path)
    }

    /// Clock refresh period
    pub fn clock_period(&self) -> Duration {
        match self.clock_interval_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => CLOCK_PERIOD,
        }
    }
}
