//! JSON file item store.
//!
//! The collection lives in a single pretty-printed JSON object keyed by
//! item id. Writes go to a sibling temp file that is renamed over the
//! original, and `<file>.lock` serializes concurrent unpacks.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs2::FileExt;
use tokio::fs;

use super::ItemStore;
use crate::domain::ItemCollection;

/// Guard for the store's exclusive lock
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    /// A guard that holds no lock (for stores without shared state)
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    /// Whether this guard holds a file lock
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.unlock() {
                tracing::warn!("Failed to release store lock: {}", e);
            }
        }
    }
}

/// Item store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonItemStore {
    path: PathBuf,
}

impl JsonItemStore {
    /// Create a store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the JSON file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }
}

#[async_trait]
impl ItemStore for JsonItemStore {
    async fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

            Ok(file)
        })
        .await
        .context("Lock task panicked")??;

        Ok(StoreLock { file: Some(file) })
    }

    async fn load(&self) -> Result<ItemCollection> {
        if !self.path.exists() {
            return Ok(ItemCollection::new());
        }

        let content = fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read item store: {}", self.path.display()))?;

        ItemCollection::from_slice(&content)
            .with_context(|| format!("Failed to parse item store: {}", self.path.display()))
    }

    async fn save(&self, items: &ItemCollection) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(items)?;
        let tmp_path = sibling(&self.path, "tmp");

        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write item store: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace item store: {}", self.path.display()))?;

        Ok(())
    }
}

/// `<path>.<suffix>` in the same directory
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssessmentItem;
    use tempfile::TempDir;

    fn sample() -> ItemCollection {
        [
            AssessmentItem::new("a", r#"{"question":{}}"#),
            AssessmentItem::new("b", r#"{"question":{}}"#),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonItemStore::new(temp.path().join("items.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = JsonItemStore::new(temp.path().join("nested").join("items.json"));

        store.save(&sample()).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, sample());
        assert!(!temp.path().join("nested").join("items.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("items.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(JsonItemStore::new(path).load().await.is_err());
    }

    #[tokio::test]
    async fn test_lock_creates_lock_file() {
        let temp = TempDir::new().unwrap();
        let store = JsonItemStore::new(temp.path().join("items.json"));

        let guard = store.lock().await.unwrap();
        assert!(guard.is_held());
        assert!(temp.path().join("items.json.lock").exists());
        drop(guard);

        // Re-acquiring after release must not block
        let again = store.lock().await.unwrap();
        assert!(again.is_held());
    }

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/data/assessment_items.json");
        assert_eq!(
            sibling(path, "lock"),
            PathBuf::from("/data/assessment_items.json.lock")
        );
    }
}
