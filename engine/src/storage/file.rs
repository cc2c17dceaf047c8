use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{KeyValueStore, StorageError, StorageResult};

/// Store that keeps one file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Io {
                key: root.display().to_string(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a key. Characters outside `[A-Za-z0-9._-]` become `_`.
    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", file_name))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // Write aside then rename so readers never see a half-written blob
        fs::write(&tmp, value).await.map_err(|e| io_error(key, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| io_error(key, e))?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("clarus-file-store-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).await.unwrap();

        assert_eq!(store.get("@clarus/state").await.unwrap(), None);
        store.set("@clarus/state", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("@clarus/state").await.unwrap(),
            Some("{\"a\":1}".to_string())
        );

        // Reopening sees the same data
        let reopened = FileStore::open(&dir).await.unwrap();
        assert!(reopened.get("@clarus/state").await.unwrap().is_some());

        store.remove("@clarus/state").await.unwrap();
        store.remove("@clarus/state").await.unwrap();
        assert_eq!(store.get("@clarus/state").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_keys_map_to_distinct_files() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).await.unwrap();

        store.set("@my-finances/reports", "[]").await.unwrap();
        store.set("@my-finances/snapshots", "[1]").await.unwrap();

        assert_eq!(
            store.get("@my-finances/reports").await.unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(
            store.get("@my-finances/snapshots").await.unwrap(),
            Some("[1]".to_string())
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
