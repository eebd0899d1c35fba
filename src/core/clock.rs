//! Model time for everything keyed on milliseconds.
use std::time::Duration;

use bevy::prelude::*;

pub(super) const DEFAULT_TIME_SCALE: f32 = 1.0;
const MIN_TIME_SCALE: f32 = 0.001;

/// Scaled time accumulated from real frame deltas.
///
/// Bubble expiry and script waits read `now_ms`, never wall-clock time, so
/// tests can drive them frame by frame.
#[derive(Resource, Debug, Clone)]
pub struct FrameClock {
    scale: f32,
    real_delta: Duration,
    scaled_delta: Duration,
    elapsed: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SCALE)
    }
}

impl FrameClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            scale: time_scale.max(MIN_TIME_SCALE),
            real_delta: Duration::ZERO,
            scaled_delta: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.scale
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.scale = time_scale.max(MIN_TIME_SCALE);
    }

    #[cfg_attr(not(feature = "core_debug"), allow(dead_code))]
    pub fn last_real_delta(&self) -> Duration {
        self.real_delta
    }

    pub fn last_scaled_delta(&self) -> Duration {
        self.scaled_delta
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Advances model time by one frame. At scale 1.0 the real delta is
    /// added unchanged, keeping millisecond deadlines exact.
    pub fn tick(&mut self, real_delta: Duration) {
        let scaled = if self.scale == DEFAULT_TIME_SCALE {
            real_delta
        } else {
            real_delta.mul_f32(self.scale)
        };
        self.real_delta = real_delta;
        self.scaled_delta = scaled;
        self.elapsed = self.elapsed.saturating_add(scaled);
    }
}
