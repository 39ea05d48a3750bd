//! Cache coordinator configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a fetched value is served before refetching
    /// Env: STOCKROOM_CACHE_STALE_SECS
    /// Default: 300
    pub stale_after_secs: u64,

    /// Retries for transient read failures
    /// Env: STOCKROOM_READ_RETRIES
    /// Default: 1
    pub read_retries: u32,

    /// Retries for transient update/delete failures (creates are never retried)
    /// Env: STOCKROOM_WRITE_RETRIES
    /// Default: 1
    pub write_retries: u32,

    /// First retry delay in milliseconds, doubled per retry
    /// Env: STOCKROOM_BACKOFF_MS
    /// Default: 200
    pub backoff_base_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_after_secs: 300, read_retries: 1, write_retries: 1, backoff_base_ms: 200 }
    }
}

impl CacheConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Some(v) = parse_env("STOCKROOM_CACHE_STALE_SECS") {
            self.stale_after_secs = v;
        }
        if let Some(v) = parse_env("STOCKROOM_READ_RETRIES") {
            self.read_retries = v;
        }
        if let Some(v) = parse_env("STOCKROOM_WRITE_RETRIES") {
            self.write_retries = v;
        }
        if let Some(v) = parse_env("STOCKROOM_BACKOFF_MS") {
            self.backoff_base_ms = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stale_after_secs == 0 {
            bail!("Invalid stale_after_secs: must be greater than 0");
        }

        if self.read_retries > 10 || self.write_retries > 10 {
            bail!("Invalid retries: at most 10 retries are allowed");
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok()?.parse().ok()
}
