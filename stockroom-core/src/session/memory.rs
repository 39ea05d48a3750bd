//! In-memory client store
//!
//! Values are lost when the process exits. Used by tests and by
//! short-lived tools that should not leave a credential on disk.

use super::store::ClientStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory client store
#[derive(Clone, Default)]
pub struct MemoryClientStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ClientStore for MemoryClientStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.len())
    }
}
