//! Configuration system for Stockroom
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Code** (builder calls on the loaded struct)
//! 2. **Environment Variables** (`STOCKROOM_*`)
//! 3. **Config File** (`stockroom.toml`)
//! 4. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use stockroom_core::config::StockroomConfig;
//!
//! let config = StockroomConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod client;
pub mod forms;
pub mod logging;

pub use cache::CacheConfig;
pub use client::ClientConfig;
pub use forms::FormsConfig;
pub use logging::LoggingSection;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE: &str = "stockroom.toml";

/// Complete Stockroom configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockroomConfig {
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub forms: FormsConfig,
    pub logging: LoggingSection,
}

impl StockroomConfig {
    /// Load `stockroom.toml` (if present) and the environment over defaults
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.client.merge(other.client);
        self.cache.merge(other.cache);
        self.forms.merge(other.forms);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.client.apply_env_vars();
        self.cache.apply_env_vars();
        self.forms.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        self.cache.validate()?;
        self.forms.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client.base_url = base_url.into();
        self
    }

    pub fn with_store_path(mut self, path: impl Into<String>) -> Self {
        self.client.store_path = path.into();
        self
    }
}
