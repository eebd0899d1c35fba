//! CorePlugin owns the model clock and the order of every frame.
use bevy::prelude::*;
#[cfg(feature = "core_debug")]
use bevy::time::TimerMode;

use super::clock::{FrameClock, DEFAULT_TIME_SCALE};

/// Frame stages, run in declaration order. Feature plugins put their Update
/// systems in one of these.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Clock,
    Movement,
    Snapshot,
    Expire,
    Coordinate,
    Interpret,
    Command,
    Render,
}

#[derive(Debug, Clone, Copy)]
pub struct CorePlugin {
    time_scale: f32,
}

impl CorePlugin {
    /// Runs model time at `time_scale` times real time.
    pub const fn with_time_scale(time_scale: f32) -> Self {
        Self { time_scale }
    }
}

impl Default for CorePlugin {
    fn default() -> Self {
        Self::with_time_scale(DEFAULT_TIME_SCALE)
    }
}

/// Paces the model-time log line to one per second of model time.
#[cfg(feature = "core_debug")]
#[derive(Resource)]
struct ModelSecondTimer(Timer);

#[cfg(feature = "core_debug")]
impl Default for ModelSecondTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(1.0, TimerMode::Repeating))
    }
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        info!("Model clock running at {:.3}x", self.time_scale);

        app.insert_resource(FrameClock::new(self.time_scale))
            .configure_sets(
                Update,
                (
                    FrameSet::Clock,
                    FrameSet::Movement,
                    FrameSet::Snapshot,
                    FrameSet::Expire,
                    FrameSet::Coordinate,
                    FrameSet::Interpret,
                    FrameSet::Command,
                    FrameSet::Render,
                )
                    .chain(),
            )
            .add_systems(Update, advance_frame_clock.in_set(FrameSet::Clock));

        #[cfg(feature = "core_debug")]
        app.init_resource::<ModelSecondTimer>()
            .add_systems(Update, log_model_seconds.after(FrameSet::Clock));
    }
}

fn advance_frame_clock(mut clock: ResMut<FrameClock>, time: Res<Time>) {
    clock.tick(time.delta());
}

/// Logs once per second of model time.
#[cfg(feature = "core_debug")]
fn log_model_seconds(clock: Res<FrameClock>, mut pacing: ResMut<ModelSecondTimer>) {
    pacing.0.tick(clock.last_scaled_delta());
    if pacing.0.just_finished() {
        info!(
            target: "core_debug",
            "Model time: {}ms | scale: {:.3} | real dt: {:.4}s",
            clock.now_ms(),
            clock.time_scale(),
            clock.last_real_delta().as_secs_f32(),
        );
    }
}
