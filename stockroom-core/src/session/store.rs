//! Durable client-side key-value storage

use anyhow::Result;
use async_trait::async_trait;

/// Client-side key-value store
///
/// Holds the session token and user preferences. Implementations decide
/// whether values survive a restart.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Number of stored keys
    async fn count(&self) -> Result<usize>;
}
