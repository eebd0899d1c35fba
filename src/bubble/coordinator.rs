//! Per-frame visibility policy for notetag bubbles.
use bevy::prelude::*;

use super::{
    board::{BubbleBoard, SceneSink},
    target::EntityLookup,
    types::BubbleId,
};

/// Notetag bubbles of the current scene, in registration order.
///
/// Each tick a tracked bubble is attached when the player is within range and
/// no other bubble sits on top of its target; otherwise it is detached.
/// Registration order, not distance, decides which of several in-range bubbles
/// on one target wins.
#[derive(Resource, Debug, Default)]
pub struct VisibilityCoordinator {
    tracked: Vec<BubbleId>,
}

impl VisibilityCoordinator {
    pub fn track(&mut self, id: BubbleId) {
        if !self.tracked.contains(&id) {
            self.tracked.push(id);
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn tracked(&self) -> &[BubbleId] {
        &self.tracked
    }

    pub fn tick(
        &self,
        board: &mut BubbleBoard,
        scene: &dyn EntityLookup,
        sink: &mut dyn SceneSink,
        distance: f32,
        margin: f32,
    ) {
        board.update_positions(scene, sink, margin);

        for &id in &self.tracked {
            let show = board.is_within_proximity(id, scene, distance) && !board.has_other_on_top(id);
            if show {
                board.attach(id, scene, sink, margin);
            } else {
                board.detach(id, sink);
            }
        }
    }

    /// Detaches and drops every tracked bubble. Safe to call repeatedly.
    pub fn teardown(&mut self, board: &mut BubbleBoard, sink: &mut dyn SceneSink) {
        for id in self.tracked.drain(..) {
            board.remove(id, sink);
        }
    }
}
