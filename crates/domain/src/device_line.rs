//! Lines received from the feeder device over the serial link.
//!
//! | Line | Meaning |
//! |------|---------|
//! | `TRUE` | The device engaged the actuator (button pressed) |
//! | `FALSE` | The device released the actuator |
//! | `Distancia: <n> <unit>` | Ultrasonic distance to the food surface |
//!
//! Anything else is reported as [`DeviceLine::Other`] and ignored upstream.

use crate::actuator::ActuatorState;
use crate::error::ValidationError;

/// Prefix of distance readings emitted by the device firmware.
pub const DISTANCE_PREFIX: &str = "Distancia:";

/// A parsed device line.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceLine {
    /// The device reports a new actuator state.
    State(ActuatorState),
    /// A single distance sample (finite, non-negative).
    Distance(f64),
    /// A line with no meaning to the bridge.
    Other(String),
}

impl DeviceLine {
    /// Parse a raw line; surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingDistance`] or
    /// [`ValidationError::InvalidDistance`] for a distance line whose value
    /// cannot be used. Unknown lines are not errors.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let line = raw.trim();
        match line {
            "TRUE" => return Ok(Self::State(ActuatorState::Engaged)),
            "FALSE" => return Ok(Self::State(ActuatorState::Idle)),
            _ => {}
        }

        if !line.starts_with(DISTANCE_PREFIX) {
            return Ok(Self::Other(line.to_string()));
        }

        // "Distancia: 5 cm" -> second whitespace-separated token
        let token = line
            .split_whitespace()
            .nth(1)
            .ok_or(ValidationError::MissingDistance)?;
        let distance: f64 = token
            .parse()
            .map_err(|_| ValidationError::InvalidDistance(token.to_string()))?;
        if !distance.is_finite() || distance < 0.0 {
            return Err(ValidationError::InvalidDistance(token.to_string()));
        }
        Ok(Self::Distance(distance))
    }
}
