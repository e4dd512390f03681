//! # powermunin-domain
//!
//! Pure domain model for the powermunin pulse-meter collector.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error taxonomy, timestamps
//! - Define **Devices** (monitored circuits and their calibration) and the
//!   read-only **Device Registry**
//! - Extract **Frames** from the meter's byte stream and decode **Records**
//! - Derive watt-hours and instantaneous watts from a record, rejecting
//!   implausible readings
//! - Aggregate readings per device (**Sample Store**)
//! - Gate publishing to a global cadence (**Publish Gate**)
//! - Model the bus connection lifecycle (**Connection State Machine**)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.

pub mod error;
pub mod time;

pub mod connection;
pub mod device;
pub mod frame;
pub mod power;
pub mod publish_gate;
pub mod record;
pub mod registry;
pub mod sample;
pub mod topic;
