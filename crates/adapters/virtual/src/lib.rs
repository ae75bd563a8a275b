//! # feedbridge-adapter-virtual
//!
//! In-memory stand-ins for the outside world, used by the `virtual`
//! backends and by end-to-end tests.
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualStore`] | `RemoteStore` | Path map with change notifications and an offline switch |
//! | [`VirtualDevice`] | `LineSource` + `LineSink` | Records writes, replays queued lines |
//!
//! ## Dependency rule
//!
//! Depends on `feedbridge-app` (port traits) and `feedbridge-domain` only.

mod device;
mod store;

pub use device::{VirtualDevice, VirtualLineSink, VirtualLineSource};
pub use store::{VirtualStore, VirtualStoreError};
