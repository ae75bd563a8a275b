//! Virtual feeder device.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use feedbridge_app::ports::{LineSink, LineSource};
use feedbridge_domain::device_line::DISTANCE_PREFIX;
use feedbridge_domain::error::FeedBridgeError;

#[derive(Default)]
struct Wire {
    inbound: VecDeque<String>,
    written: Vec<String>,
    closed: bool,
}

/// Simulated feeder on the other end of the link.
///
/// Cloning gives another handle on the same device, so a test can keep one
/// to inspect what the bridge wrote while the bridge owns the link halves.
#[derive(Clone, Default)]
pub struct VirtualDevice {
    wire: Arc<Mutex<Wire>>,
}

impl VirtualDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn wire(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Both halves of the link, as the bridge sees them.
    #[must_use]
    pub fn split(&self) -> (VirtualLineSource, VirtualLineSink) {
        (
            VirtualLineSource {
                device: self.clone(),
            },
            VirtualLineSink {
                device: self.clone(),
            },
        )
    }

    /// Queue a line as if the firmware had printed it.
    pub fn push_line(&self, line: impl Into<String>) {
        self.wire().inbound.push_back(line.into());
    }

    /// Lines the bridge wrote, oldest first.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        self.wire().written.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.wire().closed
    }

    /// Emit one distance line per `period`, cycling through `distances`.
    pub fn spawn_distance_feed(&self, distances: Vec<f64>, period: Duration) -> JoinHandle<()> {
        let device = self.clone();
        tokio::spawn(async move {
            if distances.is_empty() {
                return;
            }
            let mut interval = tokio::time::interval(period);
            for distance in distances.iter().cycle() {
                interval.tick().await;
                device.push_line(format!("{DISTANCE_PREFIX} {distance} cm"));
            }
        })
    }
}

fn closed_error() -> FeedBridgeError {
    FeedBridgeError::device(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "virtual device closed",
    ))
}

/// Inbound half of a [`VirtualDevice`].
pub struct VirtualLineSource {
    device: VirtualDevice,
}

impl LineSource for VirtualLineSource {
    async fn has_pending_data(&mut self) -> Result<bool, FeedBridgeError> {
        Ok(!self.device.wire().inbound.is_empty())
    }

    async fn read_line(&mut self) -> Result<Option<String>, FeedBridgeError> {
        Ok(self.device.wire().inbound.pop_front())
    }
}

/// Outbound half of a [`VirtualDevice`].
pub struct VirtualLineSink {
    device: VirtualDevice,
}

impl LineSink for VirtualLineSink {
    async fn write_line(&mut self, line: &str) -> Result<(), FeedBridgeError> {
        let mut wire = self.device.wire();
        if wire.closed {
            return Err(closed_error());
        }
        wire.written.push(line.to_string());
        tracing::debug!(%line, "virtual device received line");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), FeedBridgeError> {
        self.device.wire().closed = true;
        Ok(())
    }
}
