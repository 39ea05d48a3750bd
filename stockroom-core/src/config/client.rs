//! Backend client configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API root
    /// Env: STOCKROOM_BASE_URL
    /// Default: "http://127.0.0.1:8080/api"
    pub base_url: String,

    /// Request timeout in seconds
    /// Env: STOCKROOM_TIMEOUT_SECS
    /// Default: 30
    pub timeout_secs: u64,

    /// File holding the session token and preferences
    /// Env: STOCKROOM_STORE_PATH
    /// Default: "./.stockroom/session.json"
    pub store_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            timeout_secs: 30,
            store_path: "./.stockroom/session.json".to_string(),
        }
    }
}

impl ClientConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.timeout_secs = other.timeout_secs;
        self.store_path = other.store_path;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(url) = env::var("STOCKROOM_BASE_URL") {
            self.base_url = url;
        }

        if let Ok(timeout) = env::var("STOCKROOM_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }

        if let Ok(path) = env::var("STOCKROOM_STORE_PATH") {
            self.store_path = path;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("Invalid base_url: {} (must start with http:// or https://)", self.base_url);
        }

        if self.timeout_secs == 0 {
            bail!("Invalid timeout_secs: must be greater than 0");
        }

        if self.store_path.trim().is_empty() {
            bail!("Invalid store_path: cannot be empty");
        }

        Ok(())
    }
}
