//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `DIRWATCH_` and use double underscores
    /// for nested values. For example:
    /// - `DIRWATCH_GOVERNOR__MAX_EVENTS=3`
    /// - `DIRWATCH_GOVERNOR__EVENT_WINDOW_MS=1000`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config doesn't apply serde defaults for sections missing from every source
        let builder =
            set_config_default(builder, "governor.max_events", DEFAULT_MAX_EVENTS as i64)?;
        let builder = set_config_default(
            builder,
            "governor.event_window_ms",
            DEFAULT_EVENT_WINDOW_MS as i64,
        )?;
        let mut builder = set_config_default(
            builder,
            "watcher.channel_capacity",
            DEFAULT_CHANNEL_CAPACITY as i64,
        )?;

        if path.exists() {
            debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("DIRWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.dirwatch/config.toml or custom --config path)
    /// 3. Environment variables (DIRWATCH_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
