//! rwdemo configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::controller::InvalidKeyPolicy;
use crate::events::DEFAULT_CHANNEL_CAPACITY;

/// Main rwdemo configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); the CLI flag wins
    pub log_level: Option<String>,

    /// Capacity of the participant event bus
    pub event_capacity: usize,

    /// TUI input poll interval in milliseconds
    pub tick_rate_ms: u64,

    /// How long shutdown waits for participant tasks, in milliseconds
    pub shutdown_timeout_ms: u64,

    /// What to do on a key that maps to no command
    pub invalid_key: InvalidKeyPolicy,

    /// Append every participant event to this JSONL file
    pub event_log: Option<PathBuf>,

    /// Pause between keys in script mode, in milliseconds
    pub settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            tick_rate_ms: 100,
            shutdown_timeout_ms: 2000,
            invalid_key: InvalidKeyPolicy::default(),
            event_log: None,
            settle_ms: 50,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.rwdemo.yml`, then `~/.config/rwdemo/rwdemo.yml`,
    /// then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };
        Self::load_from_file(&path).ok()?.log_level
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".rwdemo.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("rwdemo").join("rwdemo.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
