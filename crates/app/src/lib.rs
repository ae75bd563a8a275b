//! # feedbridge-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `LineSource` / `LineSink` — the serial link to the feeder device
//!   - `RemoteStore` — get/set/subscribe on named paths of the shared store
//!   - `SnapshotStore` — local blob persistence for the schedule cache
//!   - `Clock` — local wall time
//! - Define the use-case services:
//!   - `ScheduleCache` — offline-resilient schedules with disk fallback
//!   - `AlarmScheduler` — daily-deduplicated time-of-day triggers
//!   - `RelayController` — the single owner of the actuator state
//!   - `LevelReporter` — food level smoothing and publication
//!   - `DeviceBridge` — the device read loop
//! - Track fire-and-forget pulses so shutdown can drain them
//!
//! ## Dependency rule
//! Depends on `feedbridge-domain` only (plus `tokio` for sync and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod pulse_tracker;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
