//! One-shot lifetimes for command bubbles, ticked with model time.
use std::time::Duration;

use bevy::prelude::*;

use super::types::BubbleId;

#[derive(Debug, Clone)]
struct BubbleLifetime {
    bubble: BubbleId,
    timer: Timer,
}

#[derive(Resource, Debug, Default)]
pub struct ExpiryTimers {
    pending: Vec<BubbleLifetime>,
}

impl ExpiryTimers {
    /// Starts a `duration_ms` lifetime for `bubble`.
    pub fn schedule(&mut self, bubble: BubbleId, duration_ms: u64) {
        self.pending.push(BubbleLifetime {
            bubble,
            timer: Timer::new(Duration::from_millis(duration_ms), TimerMode::Once),
        });
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advances every lifetime by `delta` and returns the bubbles whose
    /// timer finished, the one with the least time left first.
    pub fn tick(&mut self, delta: Duration) -> Vec<BubbleId> {
        let mut finished = Vec::new();
        self.pending.retain_mut(|lifetime| {
            let remaining = lifetime.timer.remaining();
            lifetime.timer.tick(delta);
            if lifetime.timer.is_finished() {
                finished.push((remaining, lifetime.bubble));
                false
            } else {
                true
            }
        });
        finished.sort_by_key(|(remaining, _)| *remaining);
        finished.into_iter().map(|(_, bubble)| bubble).collect()
    }

    /// Cancels every pending lifetime, returning the bubbles they belonged to.
    pub fn drain(&mut self) -> Vec<BubbleId> {
        self.pending.drain(..).map(|lifetime| lifetime.bubble).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_finishes_on_its_last_millisecond_and_fires_once() {
        let mut timers = ExpiryTimers::default();
        timers.schedule(BubbleId::new(1), 1500);

        assert!(timers.tick(Duration::from_millis(1499)).is_empty());
        assert_eq!(timers.tick(Duration::from_millis(1)), vec![BubbleId::new(1)]);
        assert!(timers.tick(Duration::from_millis(5000)).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn frame_sized_ticks_add_up_exactly() {
        let mut timers = ExpiryTimers::default();
        timers.schedule(BubbleId::new(1), 1500);

        for _ in 0..89 {
            assert!(timers.tick(Duration::from_micros(16_667)).is_empty());
        }
        assert_eq!(
            timers.tick(Duration::from_micros(16_667)),
            vec![BubbleId::new(1)]
        );
    }

    #[test]
    fn finished_bubbles_come_out_shortest_first() {
        let mut timers = ExpiryTimers::default();
        timers.schedule(BubbleId::new(1), 900);
        timers.schedule(BubbleId::new(2), 300);
        timers.schedule(BubbleId::new(3), 2000);

        assert_eq!(
            timers.tick(Duration::from_millis(1000)),
            vec![BubbleId::new(2), BubbleId::new(1)]
        );
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.drain(), vec![BubbleId::new(3)]);
        assert!(timers.is_empty());
    }
}
