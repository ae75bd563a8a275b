//! In-memory fakes of the port traits, shared by the service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tokio::sync::mpsc;

use feedbridge_domain::error::FeedBridgeError;
use feedbridge_domain::time::LocalTimestamp;

use crate::ports::{Clock, LineSink, LineSource, RemoteStore, SnapshotStore, Subscription};

/// Ordered record of every side effect, shared between fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn offline_error() -> FeedBridgeError {
    FeedBridgeError::remote(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "store offline",
    ))
}

/// Remote store kept in a hash map, with an offline switch.
#[derive(Default)]
pub struct FakeStore {
    values: Mutex<HashMap<String, Value>>,
    subscribers: Mutex<Vec<(String, mpsc::Sender<Value>)>>,
    offline: AtomicBool,
    set_delay: Mutex<Option<Duration>>,
    pub journal: Journal,
}

impl FakeStore {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub fn seed(&self, path: &str, value: Value) {
        self.values.lock().unwrap().insert(path.to_string(), value);
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        self.values.lock().unwrap().get(path).cloned()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every later `set` take `delay` before it lands.
    pub fn slow_writes(&self, delay: Duration) {
        *self.set_delay.lock().unwrap() = Some(delay);
    }

    /// Deliver a change notification as if another client wrote `value`.
    pub fn push(&self, path: &str, value: Value) {
        self.seed(path, value.clone());
        for (sub_path, tx) in self.subscribers.lock().unwrap().iter() {
            if sub_path == path {
                let _ = tx.try_send(value.clone());
            }
        }
    }
}

impl RemoteStore for FakeStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, FeedBridgeError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline_error());
        }
        Ok(self.value(path))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), FeedBridgeError> {
        let delay = *self.set_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline_error());
        }
        self.journal.push(format!("store {path}={value}"));
        self.seed(path, value);
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, FeedBridgeError> {
        let (tx, rx) = mpsc::channel(16);
        self.subscribers
            .lock()
            .unwrap()
            .push((path.to_string(), tx));
        Ok(rx)
    }
}

/// Snapshot store kept in memory, with failure switches.
#[derive(Default)]
pub struct FakeDisk {
    blob: Mutex<Option<Vec<u8>>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FakeDisk {
    pub fn with_blob(blob: &[u8]) -> Self {
        Self {
            blob: Mutex::new(Some(blob.to_vec())),
            ..Self::default()
        }
    }

    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.lock().unwrap().clone()
    }
}

fn disk_error() -> FeedBridgeError {
    FeedBridgeError::storage(std::io::Error::other("disk failure"))
}

impl SnapshotStore for FakeDisk {
    async fn write_blob(&self, blob: Vec<u8>) -> Result<(), FeedBridgeError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(disk_error());
        }
        *self.blob.lock().unwrap() = Some(blob);
        Ok(())
    }

    async fn read_blob(&self) -> Result<Option<Vec<u8>>, FeedBridgeError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(disk_error());
        }
        Ok(self.blob())
    }
}

/// Device sink recording every line into a journal.
pub struct RecordingSink {
    pub journal: Journal,
    pub fail_writes: Arc<AtomicBool>,
    pub closed: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_writes: Arc::default(),
            closed: Arc::default(),
        }
    }
}

impl LineSink for RecordingSink {
    async fn write_line(&mut self, line: &str) -> Result<(), FeedBridgeError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FeedBridgeError::device(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "link down",
            )));
        }
        self.journal.push(format!("device {line}"));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), FeedBridgeError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Device sink appending raw bytes one at a time, yielding between them.
#[derive(Clone, Default)]
pub struct ByteSink {
    pub bytes: Arc<Mutex<Vec<u8>>>,
}

impl ByteSink {
    /// Everything written so far, split on newlines.
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.bytes.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl LineSink for ByteSink {
    async fn write_line(&mut self, line: &str) -> Result<(), FeedBridgeError> {
        for byte in line.bytes().chain(std::iter::once(b'\n')) {
            self.bytes.lock().unwrap().push(byte);
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), FeedBridgeError> {
        Ok(())
    }
}

/// Device source replaying queued lines.
#[derive(Default)]
pub struct ScriptedSource {
    lines: VecDeque<Result<String, String>>,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|l| Ok(l.into())).collect(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.lines.push_back(Ok(line.to_string()));
    }

    /// Queue a read failure.
    pub fn fail_next(&mut self, message: &str) {
        self.lines.push_back(Err(message.to_string()));
    }
}

impl LineSource for ScriptedSource {
    async fn has_pending_data(&mut self) -> Result<bool, FeedBridgeError> {
        Ok(!self.lines.is_empty())
    }

    async fn read_line(&mut self) -> Result<Option<String>, FeedBridgeError> {
        match self.lines.pop_front() {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(message)) => Err(FeedBridgeError::device(std::io::Error::other(message))),
            None => Ok(None),
        }
    }
}

/// Clock returning whatever it was last set to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<LocalTimestamp>>);

impl ManualClock {
    pub fn at(ts: LocalTimestamp) -> Self {
        Self(Arc::new(Mutex::new(ts)))
    }

    pub fn set(&self, ts: LocalTimestamp) {
        *self.0.lock().unwrap() = ts;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> LocalTimestamp {
        *self.0.lock().unwrap()
    }
}

/// `YYYY-MM-DD` + `HH:MM:SS` helper.
pub fn timestamp(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}
