//! Time-of-day and wall-clock helpers.
//!
//! Schedules are expressed in local wall time without a timezone, so the
//! scheduler works on [`NaiveDateTime`] values read from a clock port.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Local wall-clock timestamp.
pub type LocalTimestamp = NaiveDateTime;

/// A minute of the day in canonical `HH:MM` (24h) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build from hour and minute.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedTimeOfDay`] when `hour > 23` or
    /// `minute > 59`.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::MalformedTimeOfDay(format!(
                "{hour}:{minute}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// The minute of the day `ts` falls into.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of(ts: &LocalTimestamp) -> Self {
        // chrono guarantees hour < 24 and minute < 60
        Self {
            hour: ts.hour() as u8,
            minute: ts.minute() as u8,
        }
    }

    #[must_use]
    pub fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    /// Parse strictly `HH:MM`; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedTimeOfDay(s.to_string());
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(malformed());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }
        let hour = (digits[0] - b'0') * 10 + (digits[1] - b'0');
        let minute = (digits[2] - b'0') * 10 + (digits[3] - b'0');
        Self::new(hour, minute).map_err(|_| malformed())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> LocalTimestamp {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn should_parse_canonical_time() {
        let t: TimeOfDay = "08:05".parse().unwrap();
        assert_eq!(t.hour(), 8);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "08:05");
    }

    #[test]
    fn should_trim_surrounding_whitespace() {
        let t: TimeOfDay = "  23:59\n".parse().unwrap();
        assert_eq!(t, TimeOfDay::new(23, 59).unwrap());
    }

    #[test]
    fn should_reject_non_canonical_forms() {
        for raw in ["8:00", "08:0", "0800", "24:00", "12:60", "ab:cd", "", "08:00:00"] {
            assert!(raw.parse::<TimeOfDay>().is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn should_take_minute_of_timestamp() {
        assert_eq!(TimeOfDay::of(&at(8, 0, 59)), "08:00".parse().unwrap());
        assert_eq!(TimeOfDay::of(&at(0, 7, 0)).to_string(), "00:07");
    }

    #[test]
    fn should_serialize_as_string() {
        let t = TimeOfDay::new(7, 30).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"07:30\"");
        let back: TimeOfDay = serde_json::from_str("\"07:30\"").unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn should_fail_deserializing_malformed_string() {
        assert!(serde_json::from_str::<TimeOfDay>("\"7.30\"").is_err());
    }
}
