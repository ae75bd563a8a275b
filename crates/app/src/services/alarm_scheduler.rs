//! Alarm scheduler — fires one pulse per schedule per day.
//!
//! Every tick reads the clock, refreshes the schedule cache and fires a pulse
//! for each entry due this minute that has not fired yet today. The set of
//! fired ids is cleared whenever the calendar date changes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use feedbridge_domain::outcome::Outcome;
use feedbridge_domain::time::{LocalTimestamp, TimeOfDay};

use crate::ports::{Clock, RemoteStore, SnapshotStore};
use crate::pulse_tracker::PulseTracker;
use crate::services::relay_controller::Pulse;
use crate::services::schedule_cache::ScheduleCache;

/// Default delay between two ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Summary of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub now: LocalTimestamp,
    /// Schedule ids whose pulse was submitted during this tick.
    pub fired: Vec<String>,
    /// Whether the schedules came from the cache instead of the store.
    pub degraded: bool,
    /// Whether the date changed since the previous tick.
    pub date_rolled: bool,
}

pub struct AlarmScheduler<R, S, C, P> {
    cache: Arc<ScheduleCache<R, S>>,
    clock: C,
    relay: Arc<P>,
    pulses: PulseTracker,
    triggered: HashSet<String>,
    last_date: NaiveDate,
    poll_interval: Duration,
}

impl<R, S, C, P> AlarmScheduler<R, S, C, P>
where
    R: RemoteStore,
    S: SnapshotStore,
    C: Clock,
    P: Pulse,
{
    /// The current clock date becomes the first observed date.
    pub fn new(
        cache: Arc<ScheduleCache<R, S>>,
        clock: C,
        relay: Arc<P>,
        pulses: PulseTracker,
        poll_interval: Duration,
    ) -> Self {
        let last_date = clock.now().date();
        Self {
            cache,
            clock,
            relay,
            pulses,
            triggered: HashSet::new(),
            last_date,
            poll_interval,
        }
    }

    /// Ids already fired today.
    #[must_use]
    pub fn triggered(&self) -> &HashSet<String> {
        &self.triggered
    }

    /// Run one scheduler iteration.
    pub async fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let today = now.date();
        let date_rolled = today != self.last_date;
        if date_rolled {
            tracing::info!(%today, cleared = self.triggered.len(), "new day, alarms re-armed");
            self.triggered.clear();
            self.last_date = today;
        }

        let (snapshot, degraded) = match self.cache.refresh().await {
            Outcome::Success(snapshot) => (snapshot, false),
            Outcome::Degraded { value, cause } => {
                tracing::warn!(%cause, "using cached schedules");
                (value, true)
            }
            Outcome::Fatal(cause) => {
                tracing::error!(%cause, "no schedules available");
                (self.cache.snapshot().await, true)
            }
        };

        let minute = TimeOfDay::of(&now);
        let mut fired = Vec::new();
        for id in snapshot.due_at(minute) {
            if !self.triggered.insert(id.to_string()) {
                continue;
            }
            tracing::info!(schedule = %id, time = %minute, "alarm due");
            let relay = Arc::clone(&self.relay);
            let source = format!("alarm {id}");
            self.pulses.spawn(async move {
                relay.pulse(source).await;
            });
            fired.push(id.to_string());
        }

        TickReport {
            now,
            fired,
            degraded,
            date_rolled,
        }
    }

    /// Tick forever, sleeping the poll interval between ticks.
    pub async fn run(mut self) {
        tracing::info!(interval = ?self.poll_interval, "alarm scheduler started");
        loop {
            self.tick().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
