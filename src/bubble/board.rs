//! Bubble storage and the per-target stacks that decide which bubble shows.
use std::collections::HashMap;

use bevy::prelude::*;

use crate::text::TextMetrics;

use super::{
    target::{EntityLookup, TargetHandle, TargetIdentity},
    types::{Bubble, BubbleId, BubbleKind},
};

/// Render set of the current scene. Receives every attach/detach, visibility
/// flip and move the board performs.
pub trait SceneSink {
    fn add(&mut self, bubble: &Bubble);

    fn remove(&mut self, id: BubbleId);

    fn set_visible(&mut self, id: BubbleId, visible: bool);

    fn move_to(&mut self, id: BubbleId, position: Vec2);
}

/// All live bubbles of the scene plus, per target, the attached bubbles in
/// attach order (most recent last).
///
/// Only the top of a stack is visible; entries below it stay attached but
/// hidden and resume when the top detaches.
#[derive(Resource, Debug, Default)]
pub struct BubbleBoard {
    bubbles: HashMap<BubbleId, Bubble>,
    stacks: HashMap<TargetIdentity, Vec<BubbleId>>,
    next_id: u64,
}

impl BubbleBoard {
    /// Builds a detached bubble and stores it.
    pub fn create(
        &mut self,
        kind: BubbleKind,
        target: TargetHandle,
        text: impl Into<String>,
        metrics: TextMetrics,
        padding: u32,
    ) -> BubbleId {
        let id = BubbleId::new(self.next_id);
        self.next_id += 1;
        self.bubbles
            .insert(id, Bubble::new(id, kind, target, text, metrics, padding));
        id
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.get(&id)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_attached(&self, id: BubbleId) -> bool {
        self.bubbles.get(&id).is_some_and(Bubble::is_attached)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_shown(&self, id: BubbleId) -> bool {
        self.bubbles.get(&id).is_some_and(Bubble::is_shown)
    }

    /// Number of shown bubbles for one target. Never more than one.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn shown_count(&self, identity: TargetIdentity) -> usize {
        self.stacks.get(&identity).map_or(0, |stack| {
            stack.iter().filter(|id| self.is_shown(**id)).count()
        })
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn attached_count(&self) -> usize {
        self.bubbles.values().filter(|bubble| bubble.is_attached()).count()
    }

    pub fn top_of(&self, identity: TargetIdentity) -> Option<BubbleId> {
        self.stacks.get(&identity).and_then(|stack| stack.last().copied())
    }

    /// True when the target's stack has a top and it is some other bubble.
    pub fn has_other_on_top(&self, id: BubbleId) -> bool {
        self.bubbles
            .get(&id)
            .and_then(|bubble| bubble.target.identity())
            .and_then(|identity| self.top_of(identity))
            .is_some_and(|top| top != id)
    }

    pub fn is_within_proximity(&self, id: BubbleId, scene: &dyn EntityLookup, distance: f32) -> bool {
        self.bubbles
            .get(&id)
            .is_some_and(|bubble| bubble.is_within_proximity(scene, distance))
    }

    /// Puts the bubble into the scene above its target and on top of the
    /// target's stack, hiding the previous top. Returns whether the bubble is
    /// attached afterwards; inert or unknown bubbles are left alone.
    pub fn attach(
        &mut self,
        id: BubbleId,
        scene: &dyn EntityLookup,
        sink: &mut dyn SceneSink,
        margin: f32,
    ) -> bool {
        let Some(bubble) = self.bubbles.get_mut(&id) else {
            return false;
        };
        if bubble.attached {
            return true;
        }
        if bubble.lost {
            return false;
        }
        let Some(identity) = bubble.target.identity() else {
            return false;
        };
        let Some(pose) = identity.pose_in(scene) else {
            return false;
        };

        bubble.position = bubble.anchor(pose, margin);
        bubble.attached = true;
        bubble.visible = true;
        sink.add(bubble);

        let stack = self.stacks.entry(identity).or_default();
        let previous_top = stack.last().copied();
        stack.push(id);

        if let Some(previous) = previous_top.filter(|previous| *previous != id) {
            if let Some(covered) = self.bubbles.get_mut(&previous) {
                covered.visible = false;
                sink.set_visible(previous, false);
            }
        }
        true
    }

    /// Takes the bubble out of the scene and off its stack. When it was the
    /// top, the entry below becomes visible again.
    pub fn detach(&mut self, id: BubbleId, sink: &mut dyn SceneSink) {
        let Some(bubble) = self.bubbles.get_mut(&id) else {
            return;
        };
        if !bubble.attached {
            return;
        }
        bubble.attached = false;
        bubble.visible = false;
        let identity = bubble.target.identity();
        sink.remove(id);

        let Some(identity) = identity else {
            return;
        };
        let Some(stack) = self.stacks.get_mut(&identity) else {
            return;
        };
        let was_top = stack.last() == Some(&id);
        stack.retain(|entry| *entry != id);
        let resumed = if was_top { stack.last().copied() } else { None };
        if stack.is_empty() {
            self.stacks.remove(&identity);
        }

        if let Some(top) = resumed {
            if let Some(bubble) = self.bubbles.get_mut(&top) {
                bubble.visible = true;
                sink.set_visible(top, true);
            }
        }
    }

    /// Detaches and drops the bubble.
    pub fn remove(&mut self, id: BubbleId, sink: &mut dyn SceneSink) -> Option<Bubble> {
        self.detach(id, sink);
        self.bubbles.remove(&id)
    }

    /// Detaches and drops every bubble.
    pub fn clear(&mut self, sink: &mut dyn SceneSink) {
        let ids: Vec<BubbleId> = self.bubbles.keys().copied().collect();
        for id in ids {
            self.remove(id, sink);
        }
    }

    /// Per-frame follow: moves every attached bubble with its target. A bubble
    /// whose target has vanished is detached and stays hidden for good.
    pub fn update_positions(
        &mut self,
        scene: &dyn EntityLookup,
        sink: &mut dyn SceneSink,
        margin: f32,
    ) {
        let mut lost = Vec::new();
        for (id, bubble) in self.bubbles.iter_mut().filter(|(_, bubble)| bubble.attached) {
            let pose = bubble
                .target
                .identity()
                .and_then(|identity| identity.pose_in(scene));
            match pose {
                Some(pose) => {
                    let position = bubble.anchor(pose, margin);
                    if position != bubble.position {
                        bubble.position = position;
                        sink.move_to(*id, position);
                    }
                }
                None => lost.push(*id),
            }
        }

        for id in lost {
            if let Some(bubble) = self.bubbles.get_mut(&id) {
                bubble.lost = true;
            }
            debug!(target: "bubble", "{} lost its target; hiding it", id);
            self.detach(id, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::{layer::BubbleLayer, test_support::metrics};
    use crate::map::SceneSnapshot;

    fn scene() -> SceneSnapshot {
        let mut scene = SceneSnapshot::default();
        scene.insert_player(Vec2::ZERO, Vec2::new(24.0, 42.0), 48.0);
        scene.insert_event(1, Vec2::new(1.0, 0.0), Vec2::new(72.0, 42.0), 48.0);
        scene
    }

    fn command(board: &mut BubbleBoard, target: TargetIdentity) -> BubbleId {
        board.create(
            BubbleKind::Command,
            TargetHandle::Live(target),
            "hi",
            metrics(2),
            12,
        )
    }

    #[test]
    fn later_attach_covers_earlier_and_resumes_it_on_detach() {
        let scene = scene();
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let a = command(&mut board, TargetIdentity::Event(1));
        let b = command(&mut board, TargetIdentity::Event(1));

        assert!(board.attach(a, &scene, &mut layer, 8.0));
        assert!(board.attach(b, &scene, &mut layer, 8.0));
        assert!(board.is_attached(a));
        assert!(!board.is_shown(a));
        assert!(board.is_shown(b));
        assert!(!layer.is_visible(a));
        assert_eq!(board.shown_count(TargetIdentity::Event(1)), 1);

        board.detach(b, &mut layer);
        assert!(board.is_shown(a));
        assert!(layer.is_visible(a));
        assert!(!layer.contains(b));
        assert_eq!(board.top_of(TargetIdentity::Event(1)), Some(a));
    }

    #[test]
    fn detaching_a_covered_bubble_leaves_the_top_alone() {
        let scene = scene();
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let a = command(&mut board, TargetIdentity::Event(1));
        let b = command(&mut board, TargetIdentity::Event(1));
        board.attach(a, &scene, &mut layer, 8.0);
        board.attach(b, &scene, &mut layer, 8.0);

        board.detach(a, &mut layer);
        assert!(board.is_shown(b));
        assert!(!board.has_other_on_top(b));

        board.detach(b, &mut layer);
        assert_eq!(board.top_of(TargetIdentity::Event(1)), None);
        assert!(layer.is_empty());
    }

    #[test]
    fn attach_and_detach_are_idempotent() {
        let scene = scene();
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let a = command(&mut board, TargetIdentity::Player);

        assert!(board.attach(a, &scene, &mut layer, 8.0));
        assert!(board.attach(a, &scene, &mut layer, 8.0));
        assert_eq!(board.top_of(TargetIdentity::Player), Some(a));
        assert!(!board.has_other_on_top(a));

        board.detach(a, &mut layer);
        board.detach(a, &mut layer);
        assert!(!board.is_attached(a));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn inert_bubbles_never_attach() {
        let scene = scene();
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let inert = board.create(BubbleKind::Command, TargetHandle::Inert, "x", metrics(1), 12);

        assert!(!board.attach(inert, &scene, &mut layer, 8.0));
        assert!(layer.is_empty());
        assert!(!board.has_other_on_top(inert));
    }

    #[test]
    fn bubbles_follow_their_target_and_hide_when_it_vanishes() {
        let mut scene = scene();
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let a = command(&mut board, TargetIdentity::Event(1));
        board.attach(a, &scene, &mut layer, 8.0);
        let before = board.get(a).map(Bubble::position);

        scene.insert_event(1, Vec2::new(2.0, 0.0), Vec2::new(120.0, 42.0), 48.0);
        board.update_positions(&scene, &mut layer, 8.0);
        let after = board.get(a).map(Bubble::position);
        assert_ne!(before, after);
        assert_eq!(after.map(|position| position.x), layer.position(a).map(|p| p.x));

        scene.remove_event(1);
        board.update_positions(&scene, &mut layer, 8.0);
        assert!(!board.is_attached(a));

        scene.insert_event(1, Vec2::new(2.0, 0.0), Vec2::new(120.0, 42.0), 48.0);
        assert!(!board.attach(a, &scene, &mut layer, 8.0));
        assert!(board.get(a).is_some_and(Bubble::is_inert));
    }

    #[test]
    fn clear_detaches_everything() {
        let scene = scene();
        let mut layer = BubbleLayer::default();
        let mut board = BubbleBoard::default();
        let a = command(&mut board, TargetIdentity::Event(1));
        let b = command(&mut board, TargetIdentity::Player);
        board.attach(a, &scene, &mut layer, 8.0);
        board.attach(b, &scene, &mut layer, 8.0);

        board.clear(&mut layer);
        assert_eq!(board.len(), 0);
        assert_eq!(board.attached_count(), 0);
        assert!(layer.is_empty());
    }
}
