//! Schedule cache — last-known-good schedules that survive store outages.
//!
//! The remote store is the source of truth. Every successful fetch replaces
//! the in-memory snapshot and is written through to disk; the disk copy is
//! only ever read at start-up, when the store cannot be reached.

use tokio::sync::Mutex;

use feedbridge_domain::error::FeedBridgeError;
use feedbridge_domain::outcome::Outcome;
use feedbridge_domain::schedule::ScheduleSnapshot;

use crate::ports::{RemoteStore, SnapshotStore};

/// In-memory schedules backed by a remote store and a disk snapshot.
pub struct ScheduleCache<R, S> {
    store: R,
    disk: S,
    path: String,
    snapshot: Mutex<ScheduleSnapshot>,
}

impl<R, S> ScheduleCache<R, S>
where
    R: RemoteStore,
    S: SnapshotStore,
{
    /// Create an empty cache reading schedules from `path` in `store`.
    pub fn new(store: R, disk: S, path: impl Into<String>) -> Self {
        Self {
            store,
            disk,
            path: path.into(),
            snapshot: Mutex::new(ScheduleSnapshot::default()),
        }
    }

    /// Populate the cache at start-up.
    ///
    /// Uses the remote schedules when reachable (an absent value counts as
    /// no schedules) and persists them. Otherwise falls back to the disk
    /// snapshot, or to an empty mapping when that is missing or unreadable.
    pub async fn load_initial(&self) -> Outcome<ScheduleSnapshot> {
        match self.fetch_remote().await {
            Ok(remote) => {
                let snapshot = remote.unwrap_or_default();
                self.replace(snapshot.clone()).await;
                self.persist(&snapshot).await;
                tracing::info!(count = snapshot.len(), "initial schedules loaded");
                Outcome::Success(snapshot)
            }
            Err(cause) => {
                tracing::warn!(%cause, "could not load schedules from store, trying disk cache");
                let snapshot = self.read_disk().await;
                self.replace(snapshot.clone()).await;
                tracing::info!(count = snapshot.len(), "schedules loaded from disk cache");
                Outcome::Degraded {
                    value: snapshot,
                    cause,
                }
            }
        }
    }

    /// Fetch the freshest schedules.
    ///
    /// On any remote failure (or an absent remote value) the cached
    /// snapshot is returned untouched and nothing is written.
    pub async fn refresh(&self) -> Outcome<ScheduleSnapshot> {
        let cause = match self.fetch_remote().await {
            Ok(Some(snapshot)) => {
                self.replace(snapshot.clone()).await;
                self.persist(&snapshot).await;
                return Outcome::Success(snapshot);
            }
            Ok(None) => FeedBridgeError::remote("store returned no schedules"),
            Err(cause) => cause,
        };
        let cached = self.snapshot().await;
        Outcome::Degraded {
            value: cached,
            cause,
        }
    }

    /// Copy of the current in-memory schedules.
    pub async fn snapshot(&self) -> ScheduleSnapshot {
        self.snapshot.lock().await.clone()
    }

    async fn replace(&self, snapshot: ScheduleSnapshot) {
        *self.snapshot.lock().await = snapshot;
    }

    async fn fetch_remote(&self) -> Result<Option<ScheduleSnapshot>, FeedBridgeError> {
        let Some(value) = self.store.get(&self.path).await? else {
            return Ok(None);
        };
        let parsed = ScheduleSnapshot::parse(&value)?;
        for (id, err) in &parsed.rejected {
            tracing::debug!(schedule = %id, %err, "skipping malformed schedule");
        }
        Ok(Some(parsed.snapshot))
    }

    async fn persist(&self, snapshot: &ScheduleSnapshot) {
        let result = match snapshot.to_blob() {
            Ok(blob) => self.disk.write_blob(blob).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::warn!(%err, "could not write schedule cache to disk");
        }
    }

    async fn read_disk(&self) -> ScheduleSnapshot {
        match self.disk.read_blob().await {
            Ok(Some(blob)) => ScheduleSnapshot::from_blob(&blob).unwrap_or_else(|err| {
                tracing::warn!(%err, "disk schedule cache is corrupt, ignoring it");
                ScheduleSnapshot::default()
            }),
            Ok(None) => ScheduleSnapshot::default(),
            Err(err) => {
                tracing::warn!(%err, "could not read schedule cache from disk");
                ScheduleSnapshot::default()
            }
        }
    }
}
