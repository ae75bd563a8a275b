//! Pulse tracker — keeps handles on fire-and-forget actuator pulses.
//!
//! Alarms never wait for the pulse they trigger, but shutdown must. Every
//! pulse task is spawned into a shared [`JoinSet`]; finished tasks are reaped
//! whenever a new one is submitted, and [`PulseTracker::drain`] gives the
//! survivors a bounded grace period before aborting them.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;

/// What happened to in-flight pulses during a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Pulses that finished within the grace period.
    pub completed: usize,
    /// Pulses aborted because the grace period ran out.
    pub abandoned: usize,
}

/// Cloneable handle on the set of running pulse tasks.
#[derive(Clone, Default)]
pub struct PulseTracker {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl PulseTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `pulse` on the runtime and track it.
    pub fn spawn<F>(&self, pulse: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks();
        while let Some(result) = tasks.try_join_next() {
            if let Err(err) = result {
                tracing::warn!(%err, "pulse task did not complete");
            }
        }
        tasks.spawn(pulse);
    }

    /// Number of tracked tasks, including finished ones not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks().len()
    }

    /// Wait up to `grace` for tracked pulses, then abort the rest.
    pub async fn drain(&self, grace: Duration) -> DrainReport {
        let mut tasks = std::mem::take(&mut *self.tasks());
        let deadline = tokio::time::Instant::now() + grace;
        let mut report = DrainReport::default();

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(()))) => report.completed += 1,
                Ok(Some(Err(err))) => {
                    tracing::warn!(%err, "pulse task did not complete");
                    report.completed += 1;
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    report.abandoned = tasks.len();
                    tasks.abort_all();
                    while tasks.join_next().await.is_some() {}
                    break;
                }
            }
        }

        if report.abandoned > 0 {
            tracing::warn!(
                completed = report.completed,
                abandoned = report.abandoned,
                "grace period elapsed with pulses still running"
            );
        } else {
            tracing::debug!(completed = report.completed, "all pulses drained");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn should_drain_finished_pulses() {
        let tracker = PulseTracker::new();
        tracker.spawn(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
        });
        tracker.spawn(async {});

        let report = tracker.drain(Duration::from_secs(10)).await;
        assert_eq!(
            report,
            DrainReport {
                completed: 2,
                abandoned: 0
            }
        );
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_abandon_pulses_exceeding_grace() {
        let tracker = PulseTracker::new();
        tracker.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tracker.spawn(async {});

        let report = tracker.drain(Duration::from_secs(5)).await;
        assert_eq!(report.completed, 1);
        assert_eq!(report.abandoned, 1);
    }

    #[tokio::test]
    async fn should_reap_finished_pulses_on_spawn() {
        let tracker = PulseTracker::new();
        tracker.spawn(async {});
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        tracker.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert_eq!(tracker.in_flight(), 1);
    }

    #[tokio::test]
    async fn should_report_nothing_when_idle() {
        let tracker = PulseTracker::new();
        let report = tracker.drain(Duration::from_secs(1)).await;
        assert_eq!(report, DrainReport::default());
    }
}
