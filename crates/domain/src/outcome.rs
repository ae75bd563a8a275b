//! Operation outcome — success, degraded fallback, or fatal failure.
//!
//! Long-running loops match on an [`Outcome`] to decide their retry policy
//! per case instead of swallowing every error the same way.

use crate::error::FeedBridgeError;

/// Result of an operation that may fall back to a secondary source.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Completed against the primary source.
    Success(T),
    /// Primary source failed; `value` comes from a fallback and is usable.
    Degraded { value: T, cause: FeedBridgeError },
    /// Nothing usable was produced.
    Fatal(FeedBridgeError),
}

impl<T> Outcome<T> {
    /// Borrow the usable value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) | Self::Degraded { value, .. } => Some(value),
            Self::Fatal(_) => None,
        }
    }

    /// Consume the outcome, keeping the usable value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(value) | Self::Degraded { value, .. } => Some(value),
            Self::Fatal(_) => None,
        }
    }

    /// The error behind a degraded or fatal outcome.
    #[must_use]
    pub fn cause(&self) -> Option<&FeedBridgeError> {
        match self {
            Self::Success(_) => None,
            Self::Degraded { cause, .. } | Self::Fatal(cause) => Some(cause),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Map the usable value, preserving the outcome kind.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Degraded { value, cause } => Outcome::Degraded {
                value: f(value),
                cause,
            },
            Self::Fatal(cause) => Outcome::Fatal(cause),
        }
    }
}
