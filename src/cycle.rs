//! Lubrication cycle state machine.
//!
//! Pure data and transition predicates; all I/O and actual transitions are
//! driven by the controller once per tick. Each variant carries exactly the
//! timestamps that are valid in that state.

use std::time::{Duration, Instant};

/// Phase of the lubrication cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No cycle in progress.
    Idle,
    /// Pump on, waiting for the pressure switch to confirm.
    AwaitingPressure { pump_started: Instant },
    /// Pressure confirmed, pump held on for the dwell period.
    HoldingPressure { pressure_reached: Instant },
    /// Pressure never arrived; pump off, error raised.
    Error,
}

impl CycleState {
    /// Whether the pressure wait has exceeded the timeout (strictly).
    pub fn pressure_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        match self {
            CycleState::AwaitingPressure { pump_started } => {
                now.duration_since(*pump_started) > timeout
            }
            _ => false,
        }
    }

    /// Whether the dwell period has fully elapsed (inclusive).
    pub fn hold_complete(&self, now: Instant, hold_time: Duration) -> bool {
        match self {
            CycleState::HoldingPressure { pressure_reached } => {
                now.duration_since(*pressure_reached) >= hold_time
            }
            _ => false,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CycleState::Idle)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CycleState::Error)
    }

    /// Short state name for status reports.
    pub fn name(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::AwaitingPressure { .. } => "awaiting_pressure",
            CycleState::HoldingPressure { .. } => "holding_pressure",
            CycleState::Error => "error",
        }
    }
}
