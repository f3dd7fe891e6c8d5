//! Machine I/O bus seam.
//!
//! The controller never talks to hardware directly; it is handed a set of
//! capabilities (read signals, write actuators, post operator messages,
//! poll runtime status) as explicit traits, never a global singleton.
//! The production adapter lives behind the `hal` feature; [`mock`] provides
//! scriptable implementations for tests and simulation.

pub mod mock;

#[cfg(feature = "hal")]
pub mod hal;

/// Latest-value snapshot of the input signals, one value each, no queuing.
///
/// Axis positions are in the same physical units as the configured
/// movement threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Signals {
    pub machine_on: bool,
    pub pressure_ok: bool,
    pub x_axis_position: f64,
    pub y_axis_position: f64,
    pub z_axis_position: f64,
}

/// Read machine signals and drive the pump/error actuators.
///
/// Outputs are level-set, not pulsed: a written level holds until the next
/// write.
pub trait MachineBus {
    fn signals(&mut self) -> Signals;
    fn set_pump_active(&mut self, on: bool);
    fn set_error_active(&mut self, on: bool);
}

/// Operator-facing message channel.
pub trait CommandSink {
    fn text_msg(&mut self, message: &str);
    fn error_msg(&mut self, message: &str);
}

/// Runtime status poll, invoked once at the top of every tick.
pub trait StatusPoller {
    fn poll(&mut self);
}

/// Command sink that forwards operator messages to the log.
///
/// The machine runtime's own operator channel is wired up by the
/// deployment; this is the default for builds without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCommandSink;

impl CommandSink for LogCommandSink {
    fn text_msg(&mut self, message: &str) {
        tracing::info!(operator = true, "{message}");
    }

    fn error_msg(&mut self, message: &str) {
        tracing::error!(operator = true, "{message}");
    }
}

/// No-op status poller for runtimes without a status channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPoller;

impl StatusPoller for NullPoller {
    fn poll(&mut self) {}
}
