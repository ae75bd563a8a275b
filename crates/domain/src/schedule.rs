//! Schedules — named time-of-day triggers and their snapshot form.
//!
//! The remote store holds schedules as a JSON object keyed by schedule id.
//! Each value is either a bare `"HH:MM"` string or a record carrying a
//! `"time"` field; both forms are accepted. Entries without a usable time
//! are rejected individually and never fail the whole batch.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{FeedBridgeError, ValidationError};
use crate::time::TimeOfDay;

/// A single named trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub id: String,
    pub time: TimeOfDay,
}

impl ScheduleEntry {
    /// Parse one schedule value as stored remotely.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the id is empty or the value carries
    /// no canonical time of day.
    pub fn from_value(id: &str, value: &Value) -> Result<Self, ValidationError> {
        if id.is_empty() {
            return Err(ValidationError::EmptyScheduleId);
        }
        let raw = match value {
            Value::String(raw) => raw.as_str(),
            Value::Object(record) => record
                .get("time")
                .and_then(Value::as_str)
                .ok_or(ValidationError::MissingTimeOfDay)?,
            _ => return Err(ValidationError::MissingTimeOfDay),
        };
        if raw.trim().is_empty() {
            return Err(ValidationError::MissingTimeOfDay);
        }
        Ok(Self {
            id: id.to_string(),
            time: raw.parse()?,
        })
    }
}

/// Complete id → time-of-day mapping at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScheduleSnapshot {
    entries: BTreeMap<String, TimeOfDay>,
}

/// Result of parsing a raw schedules payload.
#[derive(Debug, Clone, Default)]
pub struct ParsedSchedules {
    pub snapshot: ScheduleSnapshot,
    /// Entries that were skipped, with the reason.
    pub rejected: Vec<(String, ValidationError)>,
}

impl ScheduleSnapshot {
    /// Parse a raw schedules payload, skipping malformed entries.
    ///
    /// `null` is an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SchedulesNotAMap`] when the payload is
    /// neither `null` nor an object.
    pub fn parse(value: &Value) -> Result<ParsedSchedules, ValidationError> {
        let map = match value {
            Value::Null => return Ok(ParsedSchedules::default()),
            Value::Object(map) => map,
            _ => return Err(ValidationError::SchedulesNotAMap),
        };

        let mut parsed = ParsedSchedules::default();
        for (id, raw) in map {
            match ScheduleEntry::from_value(id, raw) {
                Ok(entry) => {
                    parsed.snapshot.entries.insert(entry.id, entry.time);
                }
                Err(err) => parsed.rejected.push((id.clone(), err)),
            }
        }
        Ok(parsed)
    }

    /// Decode a persisted blob.
    ///
    /// # Errors
    ///
    /// Returns [`FeedBridgeError::Storage`] when the blob is not JSON, or
    /// [`FeedBridgeError::Validation`] when it is not a mapping.
    pub fn from_blob(blob: &[u8]) -> Result<Self, FeedBridgeError> {
        let value: Value = serde_json::from_slice(blob).map_err(FeedBridgeError::storage)?;
        Ok(Self::parse(&value)?.snapshot)
    }

    /// Encode for persistence as a JSON object of `id → "HH:MM"`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedBridgeError::Storage`] if serialization fails.
    pub fn to_blob(&self) -> Result<Vec<u8>, FeedBridgeError> {
        serde_json::to_vec(self).map_err(FeedBridgeError::storage)
    }

    /// Ids of the entries scheduled at `time`.
    pub fn due_at(&self, time: TimeOfDay) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, at)| **at == time)
            .map(|(id, _)| id.as_str())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<TimeOfDay> {
        self.entries.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ScheduleEntry> + '_ {
        self.entries.iter().map(|(id, time)| ScheduleEntry {
            id: id.clone(),
            time: *time,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ScheduleEntry> for ScheduleSnapshot {
    fn from_iter<I: IntoIterator<Item = ScheduleEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.id, e.time)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tod(raw: &str) -> TimeOfDay {
        raw.parse().unwrap()
    }

    #[test]
    fn should_accept_bare_string_and_record_forms() {
        let parsed = ScheduleSnapshot::parse(&json!({
            "breakfast": "08:00",
            "dinner": {"time": "19:30", "label": "evening"},
        }))
        .unwrap();

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.snapshot.len(), 2);
        assert_eq!(parsed.snapshot.get("breakfast"), Some(tod("08:00")));
        assert_eq!(parsed.snapshot.get("dinner"), Some(tod("19:30")));
    }

    #[test]
    fn should_skip_malformed_entries_without_failing_batch() {
        let parsed = ScheduleSnapshot::parse(&json!({
            "ok": "06:15",
            "no_time": {"label": "x"},
            "number": 800,
            "blank": "   ",
            "record_blank": {"time": ""},
            "non_string_time": {"time": 8},
            "sloppy": "6:15",
        }))
        .unwrap();

        assert_eq!(parsed.snapshot.len(), 1);
        assert_eq!(parsed.snapshot.get("ok"), Some(tod("06:15")));
        assert_eq!(parsed.rejected.len(), 6);
    }

    #[test]
    fn should_treat_null_as_empty() {
        let parsed = ScheduleSnapshot::parse(&Value::Null).unwrap();
        assert!(parsed.snapshot.is_empty());
    }

    #[test]
    fn should_reject_non_object_payload() {
        assert_eq!(
            ScheduleSnapshot::parse(&json!(["08:00"])).unwrap_err(),
            ValidationError::SchedulesNotAMap
        );
    }

    #[test]
    fn should_roundtrip_through_blob() {
        let snapshot = ScheduleSnapshot::parse(&json!({
            "a": "08:00",
            "b": {"time": "12:45"},
            "c": {"enabled": true},
        }))
        .unwrap()
        .snapshot;

        let blob = snapshot.to_blob().unwrap();
        let back = ScheduleSnapshot::from_blob(&blob).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.get("c").is_none());
        assert_eq!(
            serde_json::from_slice::<Value>(&blob).unwrap(),
            json!({"a": "08:00", "b": "12:45"})
        );
    }

    #[test]
    fn should_fail_decoding_corrupt_blob() {
        let err = ScheduleSnapshot::from_blob(b"{not json").unwrap_err();
        assert!(matches!(err, FeedBridgeError::Storage(_)));
    }

    #[test]
    fn should_list_entries_due_at_time() {
        let snapshot: ScheduleSnapshot = [
            ScheduleEntry {
                id: "a".into(),
                time: tod("08:00"),
            },
            ScheduleEntry {
                id: "b".into(),
                time: tod("08:00"),
            },
            ScheduleEntry {
                id: "c".into(),
                time: tod("09:00"),
            },
        ]
        .into_iter()
        .collect();

        let due: Vec<_> = snapshot.due_at(tod("08:00")).collect();
        assert_eq!(due, vec!["a", "b"]);
        assert_eq!(snapshot.due_at(tod("10:00")).count(), 0);
    }

    #[test]
    fn should_reject_empty_schedule_id() {
        assert_eq!(
            ScheduleEntry::from_value("", &json!("08:00")).unwrap_err(),
            ValidationError::EmptyScheduleId
        );
    }
}
