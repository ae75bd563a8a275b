//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`FeedBridgeError`] at port boundaries via `From`.

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum FeedBridgeError {
    /// A domain invariant or input format was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The remote state store could not be reached or rejected the request.
    #[error("remote store error")]
    Remote(#[source] BoxError),

    /// The device link failed to read or write.
    #[error("device link error")]
    Device(#[source] BoxError),

    /// The local snapshot storage failed.
    #[error("snapshot storage error")]
    Storage(#[source] BoxError),
}

/// Domain validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A schedule entry has an empty identifier.
    #[error("schedule id must not be empty")]
    EmptyScheduleId,

    /// A schedule entry carries no usable time of day.
    #[error("schedule has no time of day")]
    MissingTimeOfDay,

    /// A time of day is not in canonical `HH:MM` form.
    #[error("time of day {0:?} is not in HH:MM form")]
    MalformedTimeOfDay(String),

    /// The schedules payload is not a mapping.
    #[error("schedules payload must be an object")]
    SchedulesNotAMap,

    /// A distance line carries no numeric token.
    #[error("distance line has no value")]
    MissingDistance,

    /// A distance token could not be parsed as a finite, non-negative number.
    #[error("invalid distance {0:?}")]
    InvalidDistance(String),

    /// Level calibration is inconsistent.
    #[error("invalid level scale: {0}")]
    InvalidLevelScale(&'static str),

    /// The smoothing window must hold at least one sample.
    #[error("smoothing window must not be empty")]
    EmptyWindow,
}

impl FeedBridgeError {
    /// Wrap any error as a remote-store failure.
    pub fn remote(err: impl Into<BoxError>) -> Self {
        Self::Remote(err.into())
    }

    /// Wrap any error as a device-link failure.
    pub fn device(err: impl Into<BoxError>) -> Self {
        Self::Device(err.into())
    }

    /// Wrap any error as a snapshot-storage failure.
    pub fn storage(err: impl Into<BoxError>) -> Self {
        Self::Storage(err.into())
    }
}
