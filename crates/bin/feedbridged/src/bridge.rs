//! Service wiring and lifecycle.
//!
//! Start-up order: load the schedules, spawn the actuator listener and the
//! alarm scheduler, then run the device read loop on the calling task until
//! `shutdown` resolves. Shutdown stops the background tasks, drains running
//! pulses and closes the device link.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use feedbridge_app::ports::{Clock, LineSink, LineSource, RemoteStore, SnapshotStore};
use feedbridge_app::pulse_tracker::{DrainReport, PulseTracker};
use feedbridge_app::services::alarm_scheduler::AlarmScheduler;
use feedbridge_app::services::device_bridge::DeviceBridge;
use feedbridge_app::services::level_reporter::LevelReporter;
use feedbridge_app::services::relay_controller::RelayController;
use feedbridge_app::services::schedule_cache::ScheduleCache;
use feedbridge_domain::error::FeedBridgeError;
use feedbridge_domain::outcome::Outcome;

use crate::config::Config;

/// Delay before subscribing again after the actuator subscription ended.
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Keep the relay fed with remote pushes, re-subscribing whenever the
/// subscription ends or cannot be established.
async fn listen_actuator<W, R>(
    relay: Arc<RelayController<W, Arc<R>>>,
    store: Arc<R>,
    path: String,
) where
    W: LineSink,
    R: RemoteStore,
{
    loop {
        match store.subscribe(&path).await {
            Ok(subscription) => {
                tracing::info!(%path, "listening for actuator changes");
                relay.run_remote_listener(subscription).await;
            }
            Err(err) => tracing::warn!(%path, %err, "could not subscribe to actuator path"),
        }
        tokio::time::sleep(RESUBSCRIBE_DELAY).await;
    }
}

/// Run the bridge until `shutdown` resolves.
///
/// # Errors
///
/// Returns a validation error when the level settings are invalid. Runtime
/// failures are logged and never end the bridge.
pub async fn run<W, L, R, S, C, F>(
    config: &Config,
    sink: W,
    mut source: L,
    store: Arc<R>,
    disk: S,
    clock: C,
    shutdown: F,
) -> Result<DrainReport, FeedBridgeError>
where
    W: LineSink + 'static,
    L: LineSource,
    R: RemoteStore + 'static,
    S: SnapshotStore + 'static,
    C: Clock + 'static,
    F: Future<Output = ()>,
{
    let paths = config.paths();
    let smoother = config.smoother()?;

    let cache = Arc::new(ScheduleCache::new(
        Arc::clone(&store),
        disk,
        paths.schedules.clone(),
    ));
    match cache.load_initial().await {
        Outcome::Success(snapshot) => {
            tracing::info!(count = snapshot.len(), "schedules ready");
        }
        Outcome::Degraded { value, cause } => {
            tracing::warn!(count = value.len(), %cause, "starting with cached schedules");
        }
        Outcome::Fatal(cause) => {
            tracing::error!(%cause, "starting without schedules");
        }
    }

    let relay = Arc::new(RelayController::new(
        sink,
        Arc::clone(&store),
        paths.actuator.clone(),
        config.dwell(),
    ));
    let listener = tokio::spawn(listen_actuator(
        Arc::clone(&relay),
        Arc::clone(&store),
        paths.actuator.clone(),
    ));

    let pulses = PulseTracker::new();
    let scheduler = AlarmScheduler::new(
        Arc::clone(&cache),
        clock,
        Arc::clone(&relay),
        pulses.clone(),
        config.scheduler_poll_interval(),
    );
    let scheduler = tokio::spawn(scheduler.run());

    let level = LevelReporter::new(Arc::clone(&store), paths.level.clone(), smoother);
    let mut device = DeviceBridge::new(Arc::clone(&relay), level, config.device_poll_interval());
    device.run(&mut source, shutdown).await;

    tracing::info!("shutting down");
    scheduler.abort();
    listener.abort();
    let report = pulses.drain(config.shutdown_grace()).await;
    if let Err(err) = relay.close().await {
        tracing::warn!(%err, "could not close device link");
    }
    tracing::info!(
        completed = report.completed,
        abandoned = report.abandoned,
        "bridge stopped"
    );
    Ok(report)
}
