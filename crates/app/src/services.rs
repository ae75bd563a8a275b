//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod alarm_scheduler;
pub mod device_bridge;
pub mod level_reporter;
pub mod relay_controller;
pub mod schedule_cache;
