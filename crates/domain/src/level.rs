//! Food level — smoothing of raw distance samples and mapping to a percentage.
//!
//! The ultrasonic sensor sits above the hopper: a short distance means the
//! hopper is full, a long one means it is empty. Samples are averaged over a
//! fixed window and the average is mapped linearly between the two
//! calibration distances.

use crate::error::ValidationError;

/// Calibration of the distance → percentage mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelScale {
    /// Distance at (or below) which the hopper reads as full.
    full_distance: f64,
    /// Distance at (or above) which the hopper reads as empty.
    empty_distance: f64,
    /// Percentage reported for a full hopper.
    max_percent: u8,
}

impl LevelScale {
    /// Build a validated scale.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLevelScale`] when a distance is not
    /// finite, `full_distance >= empty_distance`, or `max_percent > 100`.
    pub fn new(
        full_distance: f64,
        empty_distance: f64,
        max_percent: u8,
    ) -> Result<Self, ValidationError> {
        if !full_distance.is_finite() || !empty_distance.is_finite() {
            return Err(ValidationError::InvalidLevelScale(
                "distances must be finite",
            ));
        }
        if full_distance >= empty_distance {
            return Err(ValidationError::InvalidLevelScale(
                "full distance must be below empty distance",
            ));
        }
        if max_percent > 100 {
            return Err(ValidationError::InvalidLevelScale(
                "max percent must not exceed 100",
            ));
        }
        Ok(Self {
            full_distance,
            empty_distance,
            max_percent,
        })
    }

    /// Map a distance to a fill percentage in `[0, 100]`.
    ///
    /// Linear between the calibration points, truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self, distance: f64) -> u8 {
        if distance <= self.full_distance {
            return self.max_percent;
        }
        if distance >= self.empty_distance {
            return 0;
        }
        let span = self.empty_distance - self.full_distance;
        let raw = f64::from(self.max_percent) * (1.0 - (distance - self.full_distance) / span);
        // truncated and clamped, so the cast cannot wrap
        raw.trunc().clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub fn full_distance(&self) -> f64 {
        self.full_distance
    }

    #[must_use]
    pub fn empty_distance(&self) -> f64 {
        self.empty_distance
    }

    #[must_use]
    pub fn max_percent(&self) -> u8 {
        self.max_percent
    }
}

impl Default for LevelScale {
    fn default() -> Self {
        Self {
            full_distance: 1.0,
            empty_distance: 10.0,
            max_percent: 99,
        }
    }
}

/// One completed smoothing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    /// Mean distance over the window.
    pub average: f64,
    /// Fill percentage for `average`.
    pub percent: u8,
}

/// Fixed-window averaging of distance samples.
///
/// The buffer is cleared every time a window completes; there is no
/// overlap between consecutive windows.
#[derive(Debug, Clone)]
pub struct SensorSmoother {
    scale: LevelScale,
    window: usize,
    samples: Vec<f64>,
}

impl SensorSmoother {
    /// Default number of samples per window.
    pub const DEFAULT_WINDOW: usize = 10;

    /// Create a smoother averaging over `window` samples.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyWindow`] when `window` is zero.
    pub fn new(scale: LevelScale, window: usize) -> Result<Self, ValidationError> {
        if window == 0 {
            return Err(ValidationError::EmptyWindow);
        }
        Ok(Self {
            scale,
            window,
            samples: Vec::with_capacity(window),
        })
    }

    /// Add a sample; returns a reading once the window is full.
    pub fn observe(&mut self, sample: f64) -> Option<LevelReading> {
        self.samples.push(sample);
        if self.samples.len() < self.window {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let average = self.samples.iter().sum::<f64>() / self.window as f64;
        self.samples.clear();
        Some(LevelReading {
            average,
            percent: self.scale.percentage(average),
        })
    }

    /// Number of samples accumulated in the current window.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn scale(&self) -> &LevelScale {
        &self.scale
    }
}
