//! # feedbridge-adapter-serial
//!
//! Device link over a serial port (the feeder's USB connection).
//!
//! [`open`] returns a [`SerialReader`] implementing
//! [`LineSource`](feedbridge_app::ports::LineSource) and a [`SerialWriter`]
//! implementing [`LineSink`](feedbridge_app::ports::LineSink). Lines are
//! UTF-8 and `\n`-terminated; a trailing `\r` is stripped on read.
//!
//! ## Dependency rule
//! Depends on `feedbridge-app` (port traits) and `feedbridge-domain` only.

pub mod config;
pub mod error;
mod link;

pub use config::SerialConfig;
pub use error::SerialError;
pub use link::{SerialReader, SerialWriter, open};
