//! Snapshot store port — local persistence of the schedule cache.

use std::future::Future;
use std::sync::Arc;

use feedbridge_domain::error::FeedBridgeError;

/// Single-blob local storage.
pub trait SnapshotStore: Send + Sync {
    /// Replace the stored blob.
    fn write_blob(
        &self,
        blob: Vec<u8>,
    ) -> impl Future<Output = Result<(), FeedBridgeError>> + Send;

    /// Read the stored blob; `Ok(None)` when nothing was ever written.
    fn read_blob(&self) -> impl Future<Output = Result<Option<Vec<u8>>, FeedBridgeError>> + Send;
}

impl<T: SnapshotStore> SnapshotStore for Arc<T> {
    fn write_blob(
        &self,
        blob: Vec<u8>,
    ) -> impl Future<Output = Result<(), FeedBridgeError>> + Send {
        (**self).write_blob(blob)
    }

    fn read_blob(&self) -> impl Future<Output = Result<Option<Vec<u8>>, FeedBridgeError>> + Send {
        (**self).read_blob()
    }
}
