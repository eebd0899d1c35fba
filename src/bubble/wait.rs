//! Lets an event script pause until one particular bubble goes away.
use bevy::prelude::*;

use super::{board::BubbleBoard, types::BubbleId};

/// Tracks the most recent blocking bubble.
///
/// Only one bubble is observed at a time. A newer blocking show replaces the
/// tracked bubble; the older one keeps its own timer but no longer holds the
/// interpreter.
#[derive(Resource, Debug, Default)]
pub struct BubbleWait {
    tracked: Option<BubbleId>,
}

impl BubbleWait {
    pub fn track(&mut self, id: BubbleId) {
        if let Some(previous) = self.tracked.replace(id) {
            if previous != id {
                debug!(target: "bubble", "wait moved from {} to {}", previous, id);
            }
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn tracked(&self) -> Option<BubbleId> {
        self.tracked
    }

    /// The interpreter's suspend predicate: true while the tracked bubble is
    /// still attached.
    pub fn is_waiting(&self, board: &BubbleBoard) -> bool {
        self.tracked.is_some_and(|id| board.is_attached(id))
    }

    pub fn release(&mut self) {
        self.tracked = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::{
        layer::BubbleLayer,
        target::{TargetHandle, TargetIdentity},
        test_support::metrics,
        types::BubbleKind,
    };
    use crate::map::SceneSnapshot;

    #[test]
    fn waits_only_while_tracked_bubble_is_attached() {
        let mut scene = SceneSnapshot::default();
        scene.insert_player(Vec2::ZERO, Vec2::ZERO, 48.0);
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let id = board.create(
            BubbleKind::Command,
            TargetHandle::Live(TargetIdentity::Player),
            "wait",
            metrics(4),
            12,
        );
        let mut wait = BubbleWait::default();
        assert!(!wait.is_waiting(&board));

        board.attach(id, &scene, &mut layer, 8.0);
        wait.track(id);
        assert!(wait.is_waiting(&board));

        board.detach(id, &mut layer);
        assert!(!wait.is_waiting(&board));

        wait.release();
        assert_eq!(wait.tracked(), None);
    }
}
