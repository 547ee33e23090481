//! Configuration module for dirwatch
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Every field has a default, so an empty file (or no file at all) is valid.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.dirwatch/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".dirwatch").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Event governor configuration
    #[serde(default)]
    pub governor: GovernorSettings,

    /// Watch source configuration
    #[serde(default)]
    pub watcher: WatcherSettings,
}

/// Rate limits applied to change notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorSettings {
    /// Maximum admitted events inside one window
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Window length in milliseconds
    #[serde(default = "default_event_window_ms")]
    pub event_window_ms: u64,
}

impl GovernorSettings {
    /// Get the window as a duration
    pub fn event_window(&self) -> Duration {
        Duration::from_millis(self.event_window_ms)
    }
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            event_window_ms: default_event_window_ms(),
        }
    }
}

/// Settings for the underlying notification source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherSettings {
    /// Capacity of the raw event and error buffers. Notifications arriving
    /// while a buffer is full are dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.governor.max_events == 0 {
            return Err(Error::config(
                "governor.max_events must be greater than 0".to_string(),
            ));
        }

        if self.governor.event_window_ms == 0 {
            return Err(Error::config(
                "governor.event_window_ms must be greater than 0".to_string(),
            ));
        }

        if self.watcher.channel_capacity == 0 {
            return Err(Error::config(
                "watcher.channel_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
