//! Level reporter — turns raw distance samples into published percentages.

use serde_json::json;

use feedbridge_domain::error::FeedBridgeError;
use feedbridge_domain::level::{LevelReading, SensorSmoother};

use crate::ports::RemoteStore;

/// Smooths distance samples and writes each completed window to the store.
pub struct LevelReporter<R> {
    store: R,
    path: String,
    smoother: SensorSmoother,
}

impl<R: RemoteStore> LevelReporter<R> {
    pub fn new(store: R, path: impl Into<String>, smoother: SensorSmoother) -> Self {
        Self {
            store,
            path: path.into(),
            smoother,
        }
    }

    /// Feed one distance sample.
    ///
    /// Returns the reading when this sample completed a window.
    ///
    /// # Errors
    ///
    /// Returns the store error when a completed reading could not be
    /// published. The window is consumed either way.
    pub async fn observe(
        &mut self,
        distance: f64,
    ) -> Result<Option<LevelReading>, FeedBridgeError> {
        let Some(reading) = self.smoother.observe(distance) else {
            tracing::trace!(
                distance,
                pending = self.smoother.pending(),
                "distance sample buffered"
            );
            return Ok(None);
        };
        self.store.set(&self.path, json!(reading.percent)).await?;
        tracing::info!(
            average = reading.average,
            percent = reading.percent,
            "food level published"
        );
        Ok(Some(reading))
    }
}
