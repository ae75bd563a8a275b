//! Remote store port — the shared, eventually-reachable state store.

use std::future::Future;
use std::sync::Arc;

use feedbridge_domain::error::FeedBridgeError;
use serde_json::Value;
use tokio::sync::mpsc;

/// Stream of new values pushed for a subscribed path.
pub type Subscription = mpsc::Receiver<Value>;

/// Path-addressed key/value store with change notifications.
pub trait RemoteStore: Send + Sync {
    /// Read the current value at `path`; `Ok(None)` when nothing is stored.
    fn get(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Value>, FeedBridgeError>> + Send;

    /// Overwrite the value at `path`.
    fn set(
        &self,
        path: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), FeedBridgeError>> + Send;

    /// Receive every subsequent change of the value at `path`.
    fn subscribe(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Subscription, FeedBridgeError>> + Send;
}

impl<T: RemoteStore> RemoteStore for Arc<T> {
    fn get(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Value>, FeedBridgeError>> + Send {
        (**self).get(path)
    }

    fn set(
        &self,
        path: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), FeedBridgeError>> + Send {
        (**self).set(path, value)
    }

    fn subscribe(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Subscription, FeedBridgeError>> + Send {
        (**self).subscribe(path)
    }
}

/// The three logical paths the bridge uses in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Boolean actuator state.
    pub actuator: String,
    /// Mapping of schedule id to time of day.
    pub schedules: String,
    /// Food level percentage.
    pub level: String,
}

impl Default for StorePaths {
    fn default() -> Self {
        Self {
            actuator: "Boton".to_string(),
            schedules: "schedules".to_string(),
            level: "NivelComida".to_string(),
        }
    }
}
