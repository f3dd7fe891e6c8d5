//! Sliding-window axis motion detection.
//!
//! Keeps a bounded, time-ordered buffer of axis positions and answers
//! whether the machine has moved a meaningful distance within the
//! configured window.

use crate::config::{ConfigError, LubeConfig};
use std::collections::VecDeque;
use std::time::Instant;

/// Axis positions recorded at one control-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub at: Instant,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Tracks axis positions over time to detect recent movement.
///
/// The buffer holds `ceil(movement_window / update_interval)` samples, so a
/// full window spans exactly the configured time range at the configured
/// tick rate. Displacement is the maximum per-axis distance between the
/// oldest and newest sample; any single axis exceeding the threshold counts
/// as real motion.
#[derive(Debug)]
pub struct MotionTracker {
    samples: VecDeque<PositionSample>,
    capacity: usize,
    threshold: f64,
}

impl MotionTracker {
    /// Build a tracker from validated configuration.
    ///
    /// Fails when the update interval exceeds the movement window: the
    /// window could never hold the two samples needed to measure
    /// displacement.
    pub fn new(config: &LubeConfig) -> Result<Self, ConfigError> {
        if config.update_interval > config.movement_window {
            return Err(ConfigError::WindowTooSmall {
                update_interval: config.update_interval,
                movement_window: config.movement_window,
            });
        }

        let capacity = (config.movement_window.as_secs_f64()
            / config.update_interval.as_secs_f64())
        .ceil() as usize;

        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            threshold: config.movement_threshold,
        })
    }

    /// Record a position sample, evicting the oldest when the window is full.
    pub fn update(&mut self, sample: PositionSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drop all buffered samples (machine-off reset).
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Whether the axes moved more than the threshold within the window.
    ///
    /// Returns false until at least two samples are buffered. The
    /// comparison is strict: displacement exactly equal to the threshold
    /// does not count as movement.
    pub fn has_moved_recently(&self) -> bool {
        if self.samples.len() < 2 {
            return false;
        }
        self.distance_moved() > self.threshold
    }

    /// Largest absolute per-axis displacement between the oldest and newest
    /// buffered sample.
    fn distance_moved(&self) -> f64 {
        // len >= 2 checked by the caller.
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        (last.x - first.x)
            .abs()
            .max((last.y - first.y).abs())
            .max((last.z - first.z).abs())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    fn oldest(&self) -> Option<&PositionSample> {
        self.samples.front()
    }
}
