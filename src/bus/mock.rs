//! Scriptable bus implementations for tests and hardware-free simulation.
//!
//! Each mock hands out cloneable handles over shared state so a test can
//! keep one handle, give the controller another, and script signals or
//! inspect actuator levels between ticks.

use crate::bus::{CommandSink, MachineBus, Signals, StatusPoller};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockBusState {
    signals: Signals,
    pump_active: bool,
    error_active: bool,
    pump_writes: u32,
    error_writes: u32,
}

/// In-memory machine bus.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockBusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_machine_on(&self, on: bool) {
        self.lock().signals.machine_on = on;
    }

    pub fn set_pressure_ok(&self, ok: bool) {
        self.lock().signals.pressure_ok = ok;
    }

    pub fn set_positions(&self, x: f64, y: f64, z: f64) {
        let mut state = self.lock();
        state.signals.x_axis_position = x;
        state.signals.y_axis_position = y;
        state.signals.z_axis_position = z;
    }

    pub fn pump_active(&self) -> bool {
        self.lock().pump_active
    }

    pub fn error_active(&self) -> bool {
        self.lock().error_active
    }

    /// Number of pump actuator writes seen so far (for once-per-edge checks).
    pub fn pump_writes(&self) -> u32 {
        self.lock().pump_writes
    }

    /// Number of error actuator writes seen so far.
    pub fn error_writes(&self) -> u32 {
        self.lock().error_writes
    }
}

impl MachineBus for MockBus {
    fn signals(&mut self) -> Signals {
        self.lock().signals
    }

    fn set_pump_active(&mut self, on: bool) {
        let mut state = self.lock();
        state.pump_active = on;
        state.pump_writes += 1;
    }

    fn set_error_active(&mut self, on: bool) {
        let mut state = self.lock();
        state.error_active = on;
        state.error_writes += 1;
    }
}

/// Command sink recording operator messages by severity.
#[derive(Debug, Clone, Default)]
pub struct MockCommandSink {
    texts: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl MockCommandSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandSink for MockCommandSink {
    fn text_msg(&mut self, message: &str) {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn error_msg(&mut self, message: &str) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Status poller counting invocations.
#[derive(Debug, Clone, Default)]
pub struct MockStatusPoller {
    polls: Arc<Mutex<u32>>,
}

impl MockStatusPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polls(&self) -> u32 {
        *self.polls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatusPoller for MockStatusPoller {
    fn poll(&mut self) {
        *self.polls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_state() {
        let bus = MockBus::new();
        let mut controller_side = bus.clone();

        bus.set_machine_on(true);
        bus.set_positions(1.0, 2.0, 3.0);

        let signals = controller_side.signals();
        assert!(signals.machine_on);
        assert_eq!(signals.y_axis_position, 2.0);

        controller_side.set_pump_active(true);
        assert!(bus.pump_active());
        assert_eq!(bus.pump_writes(), 1);
    }

    #[test]
    fn command_sink_records_by_severity() {
        let sink = MockCommandSink::new();
        let mut controller_side = sink.clone();

        controller_side.text_msg("hello");
        controller_side.error_msg("boom");

        assert_eq!(sink.texts(), vec!["hello".to_string()]);
        assert_eq!(sink.errors(), vec!["boom".to_string()]);
    }
}
