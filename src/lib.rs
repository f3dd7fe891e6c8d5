//! Automatic lubrication control for a machine tool.
//!
//! Decides when to run the lubrication pump, verifies that pressure
//! builds, holds the pump on for a dwell period once pressure is
//! confirmed, and fails safe (operator-visible error, pump halted) when
//! pressure never arrives. Runs as a fixed-rate polling loop against the
//! machine-control runtime's I/O bus, injected as an explicit capability
//! set so the decision logic is testable without hardware.

pub mod bus;
pub mod config;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod motion;
pub mod timer;
