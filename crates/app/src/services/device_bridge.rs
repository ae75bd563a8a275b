//! Device bridge — the read loop dispatching device lines.
//!
//! Polls the inbound half of the device link, parses each line and routes it:
//! state lines go to the [`RelayController`], distance lines to the
//! [`LevelReporter`]. Nothing in here stops the loop except shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use feedbridge_domain::actuator::ActuatorState;
use feedbridge_domain::device_line::DeviceLine;
use feedbridge_domain::error::FeedBridgeError;
use feedbridge_domain::level::LevelReading;

use crate::ports::{LineSink, LineSource, RemoteStore};
use crate::services::level_reporter::LevelReporter;
use crate::services::relay_controller::RelayController;

/// Default delay between two polls of an idle link.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What a single device line turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// Actuator state published to the store.
    State(ActuatorState),
    /// Distance sample accepted, with the reading if it completed a window.
    Level(Option<LevelReading>),
    /// Distance line whose value was unusable.
    Discarded,
    /// Line with no meaning to the bridge.
    Ignored,
}

pub struct DeviceBridge<W, R> {
    relay: Arc<RelayController<W, R>>,
    level: LevelReporter<R>,
    poll_interval: Duration,
}

impl<W, R> DeviceBridge<W, R>
where
    W: LineSink,
    R: RemoteStore,
{
    pub fn new(
        relay: Arc<RelayController<W, R>>,
        level: LevelReporter<R>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            relay,
            level,
            poll_interval,
        }
    }

    /// Parse and dispatch one raw line.
    ///
    /// # Errors
    ///
    /// Returns the store error when a state or level could not be published.
    pub async fn handle_line(&mut self, raw: &str) -> Result<Handled, FeedBridgeError> {
        match DeviceLine::parse(raw) {
            Ok(DeviceLine::State(state)) => {
                self.relay.apply_device(state).await?;
                Ok(Handled::State(state))
            }
            Ok(DeviceLine::Distance(distance)) => {
                let reading = self.level.observe(distance).await?;
                Ok(Handled::Level(reading))
            }
            Ok(DeviceLine::Other(line)) => {
                tracing::debug!(%line, "ignoring device line");
                Ok(Handled::Ignored)
            }
            Err(err) => {
                tracing::warn!(line = raw.trim(), %err, "discarding malformed distance reading");
                Ok(Handled::Discarded)
            }
        }
    }

    /// One poll of the link; sleeps when nothing was read.
    async fn poll_once<L: LineSource>(&mut self, source: &mut L) {
        match source.has_pending_data().await {
            Ok(true) => match source.read_line().await {
                Ok(Some(line)) => {
                    if let Err(err) = self.handle_line(&line).await {
                        tracing::warn!(%err, "could not forward device line");
                    }
                    return;
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(%err, "device read failed"),
            },
            Ok(false) => {}
            Err(err) => tracing::warn!(%err, "device poll failed"),
        }
        tokio::time::sleep(self.poll_interval).await;
    }

    /// Read and dispatch lines until `shutdown` resolves.
    pub async fn run<L, F>(&mut self, source: &mut L, shutdown: F)
    where
        L: LineSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(interval = ?self.poll_interval, "device read loop started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                () = self.poll_once(source) => {}
            }
        }
        tracing::info!("device read loop stopped");
    }
}
