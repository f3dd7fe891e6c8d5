//! Lubrication controller.
//!
//! The only component with side effects: each tick it reads the bus,
//! advances the cycle timer and the cycle state machine, and drives the
//! pump/error actuators and operator messages accordingly. Actuator writes
//! and messages happen once per transition edge, never repeatedly while a
//! state persists.

use crate::bus::{CommandSink, MachineBus, Signals, StatusPoller};
use crate::config::{ConfigError, LubeConfig};
use crate::cycle::CycleState;
use crate::motion::{MotionTracker, PositionSample};
use crate::timer::CycleTimer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Cadence for DEBUG_MODE status reports.
const DEBUG_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Point-in-time view of signals, actuator levels and cycle phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub machine_on: bool,
    pub pressure_ok: bool,
    pub x_axis_position: f64,
    pub y_axis_position: f64,
    pub z_axis_position: f64,
    pub pump_active: bool,
    pub error_active: bool,
    pub cycle: &'static str,
}

pub struct Controller<B, C, S> {
    bus: B,
    command: C,
    stat: S,
    config: LubeConfig,
    timer: CycleTimer,
    cycle: CycleState,
    tracker: MotionTracker,
    was_machine_on: bool,
    // Last commanded actuator levels, mirrored so writes stay once-per-edge.
    pump_active: bool,
    error_active: bool,
    last_signals: Signals,
}

impl<B, C, S> Controller<B, C, S>
where
    B: MachineBus,
    C: CommandSink,
    S: StatusPoller,
{
    /// Build a controller whose interval starts counting at `now`.
    ///
    /// When lubrication is disabled the warning and operator message are
    /// emitted here, once, and every subsequent tick is a no-op.
    pub fn new(
        bus: B,
        mut command: C,
        stat: S,
        config: LubeConfig,
        now: Instant,
    ) -> Result<Self, ConfigError> {
        info!("Initializing lubrication");

        if !config.enabled {
            warn!("Lubrication logic is disabled via configuration");
            command.text_msg("Lubrication logic is disabled via configuration");
        }

        let tracker = MotionTracker::new(&config)?;
        let timer = CycleTimer::new(config.consecutive_movement_interval, now, true);

        Ok(Self {
            bus,
            command,
            stat,
            config,
            timer,
            cycle: CycleState::Idle,
            tracker,
            was_machine_on: false,
            pump_active: false,
            error_active: false,
            last_signals: Signals::default(),
        })
    }

    /// Current cycle phase, for tests and status reporting.
    pub fn cycle(&self) -> CycleState {
        self.cycle
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            machine_on: self.last_signals.machine_on,
            pressure_ok: self.last_signals.pressure_ok,
            x_axis_position: self.last_signals.x_axis_position,
            y_axis_position: self.last_signals.y_axis_position,
            z_axis_position: self.last_signals.z_axis_position,
            pump_active: self.pump_active,
            error_active: self.error_active,
            cycle: self.cycle.name(),
        }
    }

    fn set_pump(&mut self, on: bool) {
        if self.pump_active != on {
            self.bus.set_pump_active(on);
            self.pump_active = on;
        }
    }

    fn set_error(&mut self, on: bool) {
        if self.error_active != on {
            self.bus.set_error_active(on);
            self.error_active = on;
        }
    }

    /// Advance the controller by one tick of the control loop.
    pub fn tick(&mut self, now: Instant) {
        self.stat.poll();

        if !self.config.enabled {
            return;
        }

        let signals = self.bus.signals();
        self.last_signals = signals;

        // Machine off overrides everything: actuators off, full reset, and
        // a primed off→on edge so the next power-on gets a fresh cycle.
        if !signals.machine_on {
            self.set_pump(false);
            self.set_error(false);
            self.cycle = CycleState::Idle;
            self.timer.reset(now);
            self.tracker.clear();
            self.was_machine_on = false;
            return;
        }

        let machine_just_started = !self.was_machine_on;
        self.was_machine_on = true;

        self.tracker.update(PositionSample {
            at: now,
            x: signals.x_axis_position,
            y: signals.y_axis_position,
            z: signals.z_axis_position,
        });

        if self.cycle.is_error() {
            if signals.pressure_ok {
                info!("Pressure restored, clearing lubrication error");
                self.set_error(false);
                self.cycle = CycleState::Idle;
                self.timer.reset(now);
            }
            // No new cycle on the recovery tick; while erroring, nothing
            // else is evaluated at all.
            return;
        }

        let moved = self.tracker.has_moved_recently();
        let trigger = self.timer.should_trigger(now, moved) || machine_just_started;
        if trigger && self.cycle.is_idle() {
            info!("Starting lubrication pump");
            self.set_pump(true);
            self.cycle = CycleState::AwaitingPressure { pump_started: now };
            self.timer.reset(now);
        }

        match self.cycle {
            CycleState::AwaitingPressure { .. } => {
                if signals.pressure_ok {
                    info!("Lubrication pressure reached, starting hold phase");
                    self.cycle = CycleState::HoldingPressure {
                        pressure_reached: now,
                    };
                } else if self.cycle.pressure_timed_out(now, self.config.pressure_timeout) {
                    let secs = self.config.pressure_timeout.as_secs();
                    error!("Lubrication pressure not reached within {secs} seconds");
                    self.command
                        .error_msg(&format!("Lubrication pressure not reached within {secs} seconds!"));
                    self.set_error(true);
                    self.set_pump(false);
                    self.cycle = CycleState::Error;
                }
            }
            CycleState::HoldingPressure { .. } => {
                if self.cycle.hold_complete(now, self.config.pressure_hold_time) {
                    info!("Lubrication cycle complete");
                    self.set_pump(false);
                    self.cycle = CycleState::Idle;
                    self.timer.reset(now);
                }
            }
            CycleState::Idle | CycleState::Error => {}
        }
    }

    /// Fail-safe: force the pump off. Called as the last action on exit,
    /// before the bus handle is released.
    pub fn shutdown(&mut self) {
        info!("Shutting down, forcing pump off");
        self.set_pump(false);
    }
}

/// Fixed-cadence control loop.
///
/// Runs until `stop` is raised, then forces the pump off before returning.
/// With `DEBUG_MODE` set, a status report is logged at debug level every
/// few seconds, and only when it changed since the last one logged.
pub fn run_control_loop<B, C, S>(
    controller: &mut Controller<B, C, S>,
    update_interval: Duration,
    debug_mode: bool,
    stop: &AtomicBool,
) where
    B: MachineBus,
    C: CommandSink,
    S: StatusPoller,
{
    let mut last_report: Option<StatusReport> = None;
    let mut last_report_at: Option<Instant> = None;

    while !stop.load(Ordering::Relaxed) {
        let tick_start = Instant::now();
        controller.tick(tick_start);

        if debug_mode {
            let report = controller.status();
            let due = last_report_at
                .is_none_or(|at| tick_start.duration_since(at) >= DEBUG_LOG_INTERVAL);
            if due && last_report != Some(report) {
                tracing::debug!(?report, "Lubrication status");
                last_report = Some(report);
                last_report_at = Some(tick_start);
            }
        }

        sleep_with_stop(update_interval, stop, tick_start);
    }

    controller.shutdown();
}

/// Sleep out the remainder of the tick period, waking early when `stop` is
/// raised.
fn sleep_with_stop(period: Duration, stop: &AtomicBool, tick_start: Instant) {
    let elapsed = tick_start.elapsed();
    if elapsed >= period {
        return;
    }
    let remaining = period - elapsed;
    let step = remaining.min(Duration::from_millis(100));
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}
