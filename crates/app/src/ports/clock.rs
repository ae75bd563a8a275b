//! Clock port — local wall time, injectable for tests.

use std::sync::Arc;

use feedbridge_domain::time::LocalTimestamp;

/// Source of the current local wall time.
pub trait Clock: Send + Sync {
    fn now(&self) -> LocalTimestamp;
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> LocalTimestamp {
        (**self).now()
    }
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LocalTimestamp {
        chrono::Local::now().naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_local_time() {
        let before = chrono::Local::now().naive_local();
        let ts = SystemClock.now();
        let after = chrono::Local::now().naive_local();
        assert!(ts >= before);
        assert!(ts <= after);
    }
}
