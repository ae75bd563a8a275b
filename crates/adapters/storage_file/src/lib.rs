//! # feedbridge-adapter-storage-file
//!
//! [`SnapshotStore`] implementation writing the schedule snapshot to a single
//! file. Writes go to a sibling `.tmp` file first and are renamed into place,
//! so a crash never leaves a half-written snapshot behind.
//!
//! ## Dependency rule
//! Depends on `feedbridge-app` (port traits) and `feedbridge-domain` only.

pub mod error;

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use feedbridge_app::ports::SnapshotStore;
use feedbridge_domain::error::FeedBridgeError;

pub use error::FileStoreError;

/// Snapshot kept in one file on the local disk.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write(&self, blob: &[u8]) -> Result<(), FileStoreError> {
        let temp = self.temp_path();
        tokio::fs::write(&temp, blob)
            .await
            .map_err(|source| FileStoreError::Write {
                path: temp.clone(),
                source,
            })?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|source| FileStoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), bytes = blob.len(), "snapshot written");
        Ok(())
    }

    async fn read(&self) -> Result<Option<Vec<u8>>, FileStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn write_blob(&self, blob: Vec<u8>) -> Result<(), FeedBridgeError> {
        Ok(self.write(&blob).await?)
    }

    async fn read_blob(&self) -> Result<Option<Vec<u8>>, FeedBridgeError> {
        Ok(self.read().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn should_read_none_when_file_is_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("cache.json"));
        assert_eq!(store.read_blob().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_read_back_what_was_written() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("cache.json"));

        store.write_blob(br#"{"a":"08:00"}"#.to_vec()).await.unwrap();
        store.write_blob(br#"{"b":"09:00"}"#.to_vec()).await.unwrap();

        assert_eq!(
            store.read_blob().await.unwrap(),
            Some(br#"{"b":"09:00"}"#.to_vec())
        );
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn should_report_write_failure_as_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("no-such-dir").join("cache.json"));

        let err = store.write_blob(b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, FeedBridgeError::Storage(_)));
    }

    #[test]
    fn should_put_temp_file_next_to_target() {
        let store = FileSnapshotStore::new("/var/lib/feedbridge/schedules_cache.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/feedbridge/schedules_cache.json.tmp")
        );
    }
}
