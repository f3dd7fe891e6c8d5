//! Lubrication scheduling policy.
//!
//! Decides when a new lubrication cycle should begin. Lubrication happens
//! once when the machine starts, then periodically while the machine keeps
//! moving. An idle machine needs no lubrication regardless of elapsed time,
//! so the interval only fires when motion was observed since the last
//! reset.

use std::time::{Duration, Instant};

/// Interval/motion based trigger for lubrication cycles.
///
/// This is a monitor, not a pure query: [`CycleTimer::should_trigger`] is
/// meant to be evaluated exactly once per control-loop tick and updates the
/// internal motion latch as a side effect.
#[derive(Debug)]
pub struct CycleTimer {
    interval: Duration,
    last_reset: Instant,
    moved_since_reset: bool,
    start_trigger_pending: bool,
}

impl CycleTimer {
    /// Create a timer whose interval starts counting at `now`.
    ///
    /// With `lubricate_on_start` set, the first evaluation triggers
    /// unconditionally (fresh power-on always gets a cycle).
    pub fn new(interval: Duration, now: Instant, lubricate_on_start: bool) -> Self {
        Self {
            interval,
            last_reset: now,
            moved_since_reset: false,
            start_trigger_pending: lubricate_on_start,
        }
    }

    /// Restart the interval and clear the motion latch.
    pub fn reset(&mut self, now: Instant) {
        self.last_reset = now;
        self.moved_since_reset = false;
    }

    /// Whether a lubrication cycle should begin this tick.
    ///
    /// `moved_recently` is the motion tracker's reading for this tick; a
    /// true reading is latched until the next reset, so motion anywhere in
    /// the current interval counts. When the interval elapses without any
    /// observed motion the timer keeps waiting instead of restarting:
    /// motion arriving later is still measured against the original window
    /// start.
    pub fn should_trigger(&mut self, now: Instant, moved_recently: bool) -> bool {
        if self.start_trigger_pending {
            self.start_trigger_pending = false;
            return true;
        }

        if moved_recently {
            self.moved_since_reset = true;
        }

        if now.duration_since(self.last_reset) >= self.interval && self.moved_since_reset {
            self.reset(now);
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(16 * 60);

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn machine_start_triggers_once() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, true);

        assert!(timer.should_trigger(base, false));
        assert!(!timer.should_trigger(base, false));
    }

    #[test]
    fn interval_with_current_motion_triggers() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        assert!(timer.should_trigger(at(base, 961), true));
    }

    #[test]
    fn interval_with_earlier_latched_motion_triggers() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        // Motion observed mid-interval, gone again by the time it elapses.
        assert!(!timer.should_trigger(at(base, 600), true));
        assert!(timer.should_trigger(at(base, 961), false));
    }

    #[test]
    fn interval_without_motion_does_not_trigger() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        assert!(!timer.should_trigger(at(base, 961), false));
    }

    #[test]
    fn late_motion_still_counts_against_original_interval() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        // Interval elapses idle; the timer keeps waiting rather than
        // restarting, so motion one tick later fires immediately.
        assert!(!timer.should_trigger(at(base, 1200), false));
        assert!(timer.should_trigger(at(base, 1201), true));
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        assert!(!timer.should_trigger(at(base, 959), true));
        assert!(timer.should_trigger(at(base, 960), false));
    }

    #[test]
    fn trigger_fires_once_until_interval_re_elapses() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        timer.should_trigger(at(base, 5), true);
        assert!(timer.should_trigger(at(base, 960), false));
        // Same instant, no new reset or motion in between.
        assert!(!timer.should_trigger(at(base, 960), false));
        // Continued motion alone does not re-trigger early.
        assert!(!timer.should_trigger(at(base, 1000), true));
    }

    #[test]
    fn reset_midway_restarts_the_interval() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        timer.reset(at(base, 600));
        assert!(!timer.should_trigger(at(base, 1200), true));
        assert!(timer.should_trigger(at(base, 600 + 960), true));
    }

    #[test]
    fn reset_clears_the_motion_latch() {
        let base = Instant::now();
        let mut timer = CycleTimer::new(INTERVAL, base, false);

        timer.should_trigger(at(base, 5), true);
        timer.reset(at(base, 10));
        // Latch cleared: interval elapsing without fresh motion stays quiet.
        assert!(!timer.should_trigger(at(base, 10 + 960), false));
    }
}
