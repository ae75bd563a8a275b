//! # feedbridge-domain
//!
//! Pure domain model for the feedbridge feeder bridge.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, operation outcomes, time of day
//! - Define the **actuator state** mirrored between device and remote store
//! - Define **schedules** (named time-of-day triggers) and their snapshot form
//! - Parse **device lines** received over the serial link
//! - Smooth raw distance samples into a **food level** percentage
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod outcome;
pub mod time;

pub mod actuator;
pub mod device_line;
pub mod level;
pub mod schedule;
