//! Scene sink backed by UI nodes.
use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use super::{
    board::SceneSink,
    types::{Bubble, BubbleId, BubbleSize},
};

/// What the render system needs to draw one attached bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    pub text: String,
    pub size: BubbleSize,
    pub position: Vec2,
    pub visible: bool,
}

/// Render set of the current scene.
///
/// The board writes into it synchronously; `render_bubble_layer` later turns
/// the accumulated changes into UI node spawns, updates and despawns.
#[derive(Resource, Debug, Default)]
pub struct BubbleLayer {
    entries: HashMap<BubbleId, LayerEntry>,
    dirty: HashSet<BubbleId>,
    removed: Vec<BubbleId>,
}

impl BubbleLayer {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, id: BubbleId) -> bool {
        self.entries.contains_key(&id)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_visible(&self, id: BubbleId) -> bool {
        self.entries.get(&id).is_some_and(|entry| entry.visible)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn position(&self, id: BubbleId) -> Option<Vec2> {
        self.entries.get(&id).map(|entry| entry.position)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removed ids and changed entries since the last call.
    pub fn take_changes(&mut self) -> (Vec<BubbleId>, Vec<(BubbleId, LayerEntry)>) {
        let removed = std::mem::take(&mut self.removed);
        let changed = self
            .dirty
            .drain()
            .filter_map(|id| self.entries.get(&id).map(|entry| (id, entry.clone())))
            .collect();
        (removed, changed)
    }
}

impl SceneSink for BubbleLayer {
    fn add(&mut self, bubble: &Bubble) {
        self.entries.insert(
            bubble.id(),
            LayerEntry {
                text: bubble.lines().join("\n"),
                size: bubble.size(),
                position: bubble.position(),
                visible: bubble.is_shown(),
            },
        );
        self.dirty.insert(bubble.id());
    }

    fn remove(&mut self, id: BubbleId) {
        if self.entries.remove(&id).is_some() {
            self.dirty.remove(&id);
            self.removed.push(id);
        }
    }

    fn set_visible(&mut self, id: BubbleId, visible: bool) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.visible = visible;
            self.dirty.insert(id);
        }
    }

    fn move_to(&mut self, id: BubbleId, position: Vec2) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.position = position;
            self.dirty.insert(id);
        }
    }
}

/// Marker for the UI node drawing one bubble.
#[derive(Component, Debug)]
pub struct BubbleNode {
    pub id: BubbleId,
}

/// Root overlay node all bubble nodes are parented to.
#[derive(Resource, Debug)]
pub struct BubbleUiRoot(pub Entity);

/// Maps bubble ids to the UI node currently drawing them.
#[derive(Resource, Debug, Default)]
pub struct BubbleNodes {
    pub by_bubble: HashMap<BubbleId, Entity>,
}
