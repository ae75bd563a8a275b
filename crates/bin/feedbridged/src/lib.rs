//! # feedbridged
//!
//! Composition root of the feeder bridge, split into a library so the
//! wiring can be exercised end to end with virtual adapters.
//!
//! - [`config`] loads and validates `feedbridge.toml`
//! - [`bridge`] builds the services around a device link and a remote store
//!   and runs them until shutdown

pub mod bridge;
pub mod config;
