//! Virtual remote store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;

use feedbridge_app::ports::{RemoteStore, Subscription};
use feedbridge_domain::error::FeedBridgeError;

const SUBSCRIPTION_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum VirtualStoreError {
    #[error("virtual store is offline")]
    Offline,
}

impl From<VirtualStoreError> for FeedBridgeError {
    fn from(err: VirtualStoreError) -> Self {
        FeedBridgeError::remote(err)
    }
}

#[derive(Default)]
struct Paths {
    values: HashMap<String, Value>,
    watchers: HashMap<String, Vec<mpsc::Sender<Value>>>,
}

impl Paths {
    fn notify(&mut self, path: &str, value: &Value) {
        if let Some(watchers) = self.watchers.get_mut(path) {
            watchers.retain(|tx| !matches!(
                tx.try_send(value.clone()),
                Err(mpsc::error::TrySendError::Closed(_))
            ));
        }
    }
}

/// Remote store living in memory.
///
/// Every write, including the bridge's own, is delivered to the
/// subscribers of its path, and a new subscriber first receives the current
/// value. Both mirror how hosted realtime stores behave.
#[derive(Default)]
pub struct VirtualStore {
    paths: Mutex<Paths>,
    offline: AtomicBool,
}

impl VirtualStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn paths(&self) -> MutexGuard<'_, Paths> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> Result<(), VirtualStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(VirtualStoreError::Offline)
        } else {
            Ok(())
        }
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_offline(&self, offline: bool) {
        tracing::info!(offline, "virtual store connectivity changed");
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store a value without notifying subscribers.
    pub fn seed(&self, path: &str, value: Value) {
        self.paths().values.insert(path.to_string(), value);
    }

    /// Write a value as another client would, notifying subscribers.
    pub fn push(&self, path: &str, value: Value) {
        let mut paths = self.paths();
        paths.notify(path, &value);
        paths.values.insert(path.to_string(), value);
    }

    /// Current value at `path`, regardless of the offline switch.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<Value> {
        self.paths().values.get(path).cloned()
    }
}

impl RemoteStore for VirtualStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, FeedBridgeError> {
        self.check_online()?;
        Ok(self.value(path))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), FeedBridgeError> {
        self.check_online()?;
        self.push(path, value);
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, FeedBridgeError> {
        self.check_online()?;
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        let mut paths = self.paths();
        if let Some(current) = paths.values.get(path) {
            let _ = tx.try_send(current.clone());
        }
        paths.watchers.entry(path.to_string()).or_default().push(tx);
        Ok(rx)
    }
}
