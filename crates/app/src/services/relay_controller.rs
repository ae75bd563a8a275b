//! Relay controller — the single owner of the actuator state.
//!
//! Three producers change the actuator: scheduled pulses, pushes from the
//! remote store and state lines reported by the device. Each gets one named
//! operation here. Device writes all go through one lock so lines never
//! interleave; store writes happen outside it so a slow store never holds
//! up the device. The controller remembers which state it last mirrored to
//! the device so the store echoing our own writes back does not trigger a
//! second, redundant device write.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use feedbridge_domain::actuator::ActuatorState;
use feedbridge_domain::error::FeedBridgeError;
use feedbridge_domain::outcome::Outcome;

use crate::ports::{LineSink, RemoteStore, Subscription};

/// Default time the actuator stays engaged during a pulse.
pub const DEFAULT_DWELL: Duration = Duration::from_secs(6);

/// Something that can run a timed actuator pulse.
pub trait Pulse: Send + Sync + 'static {
    /// Engage, dwell, release. `source` names who asked, for the logs.
    fn pulse(&self, source: String) -> impl Future<Output = Outcome<()>> + Send;
}

/// Result of applying a remote push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The device was told to enter this state.
    Written(ActuatorState),
    /// The device already mirrors this state.
    Unchanged,
    /// The pushed value was not a boolean.
    Ignored,
}

struct DeviceMirror<W> {
    sink: W,
    last: Option<ActuatorState>,
}

impl<W: LineSink> DeviceMirror<W> {
    async fn write(&mut self, state: ActuatorState) -> Result<(), FeedBridgeError> {
        match self.sink.write_line(state.device_line()).await {
            Ok(()) => {
                self.last = Some(state);
                Ok(())
            }
            Err(err) => {
                self.last = None;
                Err(err)
            }
        }
    }
}

/// Serializes every change of the actuator across device and store.
pub struct RelayController<W, R> {
    device: Mutex<DeviceMirror<W>>,
    store: R,
    actuator_path: String,
    dwell: Duration,
}

impl<W, R> RelayController<W, R>
where
    W: LineSink,
    R: RemoteStore,
{
    pub fn new(sink: W, store: R, actuator_path: impl Into<String>, dwell: Duration) -> Self {
        Self {
            device: Mutex::new(DeviceMirror { sink, last: None }),
            store,
            actuator_path: actuator_path.into(),
            dwell,
        }
    }

    /// State last written to (or reported by) the device, if known.
    pub async fn state(&self) -> Option<ActuatorState> {
        self.device.lock().await.last
    }

    /// Store then device. Only the device write holds the lock.
    ///
    /// The target state is recorded as mirrored before the store write, so
    /// the store echoing that write back is skipped by
    /// [`Self::apply_remote`].
    async fn drive(&self, state: ActuatorState, source: &str) -> Result<(), FeedBridgeError> {
        self.device.lock().await.last = Some(state);
        if let Err(err) = self
            .store
            .set(&self.actuator_path, state.store_value())
            .await
        {
            let mut device = self.device.lock().await;
            if device.last == Some(state) {
                device.last = None;
            }
            tracing::error!(%source, %state, step = "store", %err, "pulse step failed");
            return Err(err);
        }
        let mut device = self.device.lock().await;
        if let Err(err) = device.write(state).await {
            tracing::error!(%source, %state, step = "device", %err, "pulse step failed");
            return Err(err);
        }
        Ok(())
    }

    /// Run one full pulse: engage, hold for the dwell time, release.
    ///
    /// A failed step abandons the pulse without retrying; the store and the
    /// device may then disagree until the next change.
    pub async fn run_pulse(&self, source: &str) -> Outcome<()> {
        tracing::info!(%source, "pulse started");
        if let Err(cause) = self.drive(ActuatorState::Engaged, source).await {
            return Outcome::Fatal(cause);
        }
        tokio::time::sleep(self.dwell).await;
        if let Err(cause) = self.drive(ActuatorState::Idle, source).await {
            return Outcome::Fatal(cause);
        }
        tracing::info!(%source, "pulse finished");
        Outcome::Success(())
    }

    /// Mirror a value pushed on the actuator path to the device.
    ///
    /// # Errors
    ///
    /// Returns the device error when the line could not be written.
    pub async fn apply_remote(&self, value: &Value) -> Result<Applied, FeedBridgeError> {
        let Some(state) = ActuatorState::from_store_value(value) else {
            tracing::debug!(%value, "ignoring non-boolean actuator value");
            return Ok(Applied::Ignored);
        };
        let mut device = self.device.lock().await;
        if device.last == Some(state) {
            tracing::debug!(%state, "device already mirrors remote state");
            return Ok(Applied::Unchanged);
        }
        device.write(state).await?;
        tracing::info!(%state, "remote state mirrored to device");
        Ok(Applied::Written(state))
    }

    /// Publish a state reported by the device to the store.
    ///
    /// # Errors
    ///
    /// Returns the store error when the value could not be written.
    pub async fn apply_device(&self, state: ActuatorState) -> Result<(), FeedBridgeError> {
        self.device.lock().await.last = Some(state);
        self.store
            .set(&self.actuator_path, state.store_value())
            .await?;
        tracing::info!(%state, "device state published");
        Ok(())
    }

    /// Feed every value of `subscription` through [`Self::apply_remote`]
    /// until the store closes it.
    pub async fn run_remote_listener(&self, mut subscription: Subscription) {
        while let Some(value) = subscription.recv().await {
            if let Err(err) = self.apply_remote(&value).await {
                tracing::warn!(%err, "could not mirror remote state to device");
            }
        }
        tracing::info!("actuator subscription closed");
    }

    /// Release the device link.
    ///
    /// # Errors
    ///
    /// Returns the device error raised while closing.
    pub async fn close(&self) -> Result<(), FeedBridgeError> {
        self.device.lock().await.sink.close().await
    }
}

impl<W, R> Pulse for RelayController<W, R>
where
    W: LineSink + 'static,
    R: RemoteStore + 'static,
{
    async fn pulse(&self, source: String) -> Outcome<()> {
        self.run_pulse(&source).await
    }
}
