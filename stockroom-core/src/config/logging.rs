//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Env: STOCKROOM_LOG_LEVEL
    /// Default: "info"
    pub level: String,
    /// human, json or logfmt
    /// Env: STOCKROOM_LOG_FORMAT
    /// Default: "human"
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string() }
    }
}

impl LoggingSection {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("STOCKROOM_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("STOCKROOM_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level.parse::<crate::logging::LogLevel>().is_err() {
            bail!("Invalid log level: {}", self.level);
        }
        if self.format.parse::<crate::logging::LogFormat>().is_err() {
            bail!("Invalid log format: {} (expected human, json or logfmt)", self.format);
        }
        Ok(())
    }
}
