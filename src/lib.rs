//! Autonomous power state transition (APST) management for NVMe controllers.
//!
//! This crate decides, from a controller's hardware-reported power state
//! table, which non-operational states the device should autonomously enter
//! while idle and how long to wait before entering each, and keeps that
//! decision synchronized with a live latency tolerance budget and with the
//! controller's re-identification lifecycle.
//!
//! The crate is `no_std` and carries no I/O path of its own: command
//! submission, completions, and DMA placement belong to the surrounding
//! driver, which plugs in through the [`AdminTransport`] and
//! [`LatencyToleranceHook`] seams.
//!
//! # Overview
//! - [`IdentifyController`] parses the identify buffer the driver fetched.
//! - [`build_apst_table`] turns a [`PowerContext`] and a latency ceiling
//!   into the 32-entry transition feature payload.
//! - [`ApstManager`] owns the context for one controller, reacts to
//!   identify refreshes and latency tolerance requests, and programs the
//!   feature through the transport.
//!
//! APST is a best-effort power optimization: no failure in this crate is
//! ever escalated to controller-fatal.
#![no_std]
#![deny(missing_docs)]

#[cfg(test)]
extern crate std;

mod error;
mod features;
mod identify;
mod latency;
mod manager;
mod power;

pub use error::{Error, Result, StatusCode, StatusCodeType};
pub use features::{AdminTransport, FeatureId};
pub use identify::{IdentifyController, PS_FLAG_NON_OPERATIONAL, PowerStateDescriptor};
pub use latency::{
    LATENCY_TOLERANCE_ANY, LATENCY_TOLERANCE_NO_CONSTRAINT, LatencyToleranceHook,
    normalize_latency_tolerance,
};
pub use manager::{ApstManager, ApstOptions};
pub use power::{
    APST_MAX_TRANSITION_UNITS, APST_TRANSITION_UNIT_US, ApstTable, MAX_POWER_STATE_INDEX,
    PowerContext, PowerState, build_apst_table,
};
