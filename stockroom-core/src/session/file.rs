//! File-backed client store
//!
//! Keeps every value in one JSON object on disk so the session token and
//! preferences survive a restart. Reads are served from memory; every write
//! rewrites the file.

use super::store::ClientStore;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// JSON-file client store
#[derive(Clone)]
pub struct FileClientStore {
    path: PathBuf,
    values: Arc<RwLock<BTreeMap<String, String>>>,
    // Serializes file writes so the file always reflects the latest map
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileClientStore {
    /// Open the store at `path`, loading existing values if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read client store {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse client store {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        log::debug!("Loaded {} client store keys from {}", values.len(), path.display());

        Ok(Self {
            path,
            values: Arc::new(RwLock::new(values)),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _write = self.write_lock.lock().await;

        let snapshot = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut values);
            serde_json::to_string_pretty(&*values)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create client store directory {}", parent.display())
                })?;
            }
        }

        // Write-then-rename keeps the previous file intact if the write fails
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, snapshot)
            .await
            .with_context(|| format!("Failed to write client store {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace client store {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClientStore for FileClientStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.update(move |values| {
            values.insert(key, value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.update(move |values| {
            values.remove(&key);
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileClientStore::open(&path).unwrap();
        store.set("session.token", "tok-1").await.unwrap();
        store.set("prefs.theme", "dark").await.unwrap();
        drop(store);

        let reopened = FileClientStore::open(&path).unwrap();
        assert_eq!(reopened.get("session.token").await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(reopened.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_remove_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileClientStore::open(&path).unwrap();
        store.set("session.token", "tok-1").await.unwrap();
        store.remove("session.token").await.unwrap();

        let reopened = FileClientStore::open(&path).unwrap();
        assert_eq!(reopened.get("session.token").await.unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(FileClientStore::open(&path).is_err());
    }
}
