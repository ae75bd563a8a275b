//! Actuator state — the feeder gate mirrored on the device and in the store.

use serde::{Deserialize, Serialize};

/// Whether the feeder actuator is engaged (dispensing) or idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorState {
    Engaged,
    #[default]
    Idle,
}

impl ActuatorState {
    /// Line sent to (and received from) the device for this state.
    #[must_use]
    pub fn device_line(self) -> &'static str {
        match self {
            Self::Engaged => "TRUE",
            Self::Idle => "FALSE",
        }
    }

    /// Representation stored on the remote actuator path.
    #[must_use]
    pub fn store_value(self) -> serde_json::Value {
        serde_json::Value::Bool(self.is_engaged())
    }

    /// Interpret a remote store value; anything but a boolean is `None`.
    #[must_use]
    pub fn from_store_value(value: &serde_json::Value) -> Option<Self> {
        value.as_bool().map(Self::from)
    }

    #[must_use]
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Engaged)
    }
}

impl From<bool> for ActuatorState {
    fn from(engaged: bool) -> Self {
        if engaged { Self::Engaged } else { Self::Idle }
    }
}

impl std::fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engaged => f.write_str("engaged"),
            Self::Idle => f.write_str("idle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_default_to_idle() {
        assert_eq!(ActuatorState::default(), ActuatorState::Idle);
    }

    #[test]
    fn should_render_device_lines() {
        assert_eq!(ActuatorState::Engaged.device_line(), "TRUE");
        assert_eq!(ActuatorState::Idle.device_line(), "FALSE");
    }

    #[test]
    fn should_store_as_boolean() {
        assert_eq!(ActuatorState::Engaged.store_value(), json!(true));
        assert_eq!(ActuatorState::Idle.store_value(), json!(false));
    }

    #[test]
    fn should_only_accept_boolean_store_values() {
        assert_eq!(
            ActuatorState::from_store_value(&json!(true)),
            Some(ActuatorState::Engaged)
        );
        assert_eq!(
            ActuatorState::from_store_value(&json!(false)),
            Some(ActuatorState::Idle)
        );
        assert_eq!(ActuatorState::from_store_value(&json!("true")), None);
        assert_eq!(ActuatorState::from_store_value(&json!(1)), None);
        assert_eq!(ActuatorState::from_store_value(&serde_json::Value::Null), None);
    }
}
