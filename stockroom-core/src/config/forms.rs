//! Form configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Capacity of each repeatable row group
    /// Env: STOCKROOM_MAX_ROWS
    /// Default: 5
    pub max_rows: usize,

    /// Choices offered by dropdown attributes
    /// Env: STOCKROOM_DROPDOWN_OPTIONS (comma-separated)
    /// Default: []
    pub dropdown_options: Vec<String>,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self { max_rows: crate::fields::DEFAULT_MAX_ROWS, dropdown_options: Vec::new() }
    }
}

impl FormsConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(max) = env::var("STOCKROOM_MAX_ROWS") {
            if let Ok(m) = max.parse() {
                self.max_rows = m;
            }
        }

        if let Ok(options) = env::var("STOCKROOM_DROPDOWN_OPTIONS") {
            self.dropdown_options = options
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            bail!("Invalid max_rows: must be at least 1");
        }
        Ok(())
    }
}
