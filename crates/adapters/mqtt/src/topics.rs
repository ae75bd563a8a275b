//! Per-topic state shared between the store handle and the event loop.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{Notify, mpsc, watch};

use crate::error::MqttError;

/// Capacity of each subscription channel.
const SUBSCRIPTION_CAPACITY: usize = 32;

#[derive(Default)]
struct Table {
    /// Topics the client subscribes to on every (re)connect.
    topics: BTreeSet<String>,
    /// Values seen since the last connect; `None` means known to be empty.
    values: HashMap<String, Option<Value>>,
    watchers: HashMap<String, Vec<mpsc::Sender<Value>>>,
}

pub(crate) struct Topics {
    table: Mutex<Table>,
    connected: watch::Sender<bool>,
    arrivals: Notify,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            table: Mutex::default(),
            connected: watch::channel(false).0,
            arrivals: Notify::new(),
        }
    }
}

/// Decode a retained payload. Empty payloads and JSON `null` clear the topic.
fn decode(payload: &[u8]) -> Result<Option<Value>, MqttError> {
    if payload.is_empty() {
        return Ok(None);
    }
    match serde_json::from_slice(payload).map_err(MqttError::PayloadParse)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

impl Topics {
    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `topic`; returns `true` when it was not tracked yet.
    pub(crate) fn track(&self, topic: &str) -> bool {
        self.table().topics.insert(topic.to_string())
    }

    pub(crate) fn tracked(&self) -> Vec<String> {
        self.table().topics.iter().cloned().collect()
    }

    pub(crate) fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub(crate) fn connection(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    /// A new session starts: retained values will be delivered again.
    pub(crate) fn on_connected(&self) {
        self.table().values.clear();
        self.connected.send_replace(true);
    }

    pub(crate) fn on_disconnected(&self) {
        self.connected.send_replace(false);
    }

    /// Record an incoming publish and forward it to the watchers.
    pub(crate) fn on_publish(&self, topic: &str, payload: &[u8]) {
        let value = match decode(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%topic, %err, "ignoring undecodable payload");
                return;
            }
        };
        {
            let mut table = self.table();
            if let Some(value) = &value
                && let Some(watchers) = table.watchers.get_mut(topic)
            {
                watchers.retain(|tx| match tx.try_send(value.clone()) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(%topic, "subscriber lagging, dropping update");
                        true
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                });
            }
            table.values.insert(topic.to_string(), value);
        }
        self.arrivals.notify_waiters();
    }

    /// Remember a value we published ourselves.
    pub(crate) fn on_local_set(&self, topic: &str, value: &Value) {
        let value = (!value.is_null()).then(|| value.clone());
        self.table().values.insert(topic.to_string(), value);
    }

    /// `Some` when the topic's value is known for this session.
    pub(crate) fn cached(&self, topic: &str) -> Option<Option<Value>> {
        self.table().values.get(topic).cloned()
    }

    /// Nothing arrived for `topic`: remember it as empty.
    pub(crate) fn mark_absent(&self, topic: &str) {
        self.table().values.entry(topic.to_string()).or_insert(None);
    }

    pub(crate) fn watch(&self, topic: &str) -> mpsc::Receiver<Value> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        self.table()
            .watchers
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        rx
    }

    /// Future resolving on the next publish of any topic.
    pub(crate) fn arrival(&self) -> tokio::sync::futures::Notified<'_> {
        self.arrivals.notified()
    }
}
