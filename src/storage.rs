//! Key → bytes storage gateway.
//!
//! Shard files, listings, cross references and search indexes are all
//! fetched through [`StorageGateway::get`]; a missing key is `Ok(None)`, not
//! an error.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::StorageError;

#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

#[async_trait]
impl<T: StorageGateway + ?Sized> StorageGateway for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key).await
    }
}

/// Files under a data directory, one file per key.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        // Keys are relative; refuse anything that could leave the root.
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.root.join(key))
    }
}

#[async_trait]
impl StorageGateway for FsStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(path) = self.path_for(key) else {
            tracing::debug!(key, "rejected storage key");
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => {
                tracing::warn!(key, error = %source, "storage read failed");
                Err(StorageError::Io { key: key.to_string(), source: Arc::new(source) })
            }
        }
    }
}

/// In-process store, mostly for tests and fixtures.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.insert(key.into(), bytes.into());
    }

    /// Store `value` serialized as JSON.
    pub fn insert_json(&self, key: impl Into<String>, value: &serde_json::Value) {
        self.insert(key, value.to_string());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl StorageGateway for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.get(key).map(|v| v.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.insert("a/xref.json", "{}");
        assert_eq!(storage.get("a/xref.json").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.get("a/index.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fs_storage_reads_and_misses() {
        let root = std::env::temp_dir().join(format!("moedict-fs-{}", std::process::id()));
        tokio::fs::create_dir_all(root.join("ack")).await.unwrap();
        tokio::fs::write(root.join("ack/0.txt"), b"{}").await.unwrap();

        let storage = FsStorage::new(&root);
        assert_eq!(storage.get("ack/0.txt").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.get("ack/1.txt").await.unwrap(), None);
        assert_eq!(storage.get("../etc/passwd").await.unwrap(), None);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
