//! File storage error types.

use std::path::PathBuf;

use feedbridge_domain::error::FeedBridgeError;

/// Errors originating from the snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<FileStoreError> for FeedBridgeError {
    fn from(err: FileStoreError) -> Self {
        FeedBridgeError::storage(err)
    }
}
