//! renderwait configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::coordinator::CoordinatorConfig;

/// Main renderwait configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// How long the render driver waits for an outcome
    #[serde(rename = "render-timeout-ms")]
    pub render_timeout_ms: u64,

    /// Coordinator settings
    pub coordinator: CoordinatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            render_timeout_ms: 10_000,
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise the first candidate file that loads
    /// and validates wins, falling back to defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => warn!("Skipping config {}: {:#}", candidate.display(), e),
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// ./renderwait.yml, then ~/.config/renderwait/renderwait.yml
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("renderwait.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("renderwait").join("renderwait.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.render_timeout_ms == 0 {
            return Err(eyre!("render-timeout-ms must be greater than zero"));
        }
        self.coordinator.validate().context("Invalid coordinator config")
    }

    /// The render timeout as a Duration
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }
}
