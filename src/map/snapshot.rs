//! Per-frame copy of where every map character stands.
use std::collections::HashMap;

use bevy::prelude::*;

use crate::bubble::{EntityLookup, EntityPose};

/// Rebuilt each frame before expiry and visibility run, so bubble logic reads
/// a consistent scene without touching the ECS directly.
#[derive(Resource, Debug, Clone, Default)]
pub struct SceneSnapshot {
    player: Option<EntityPose>,
    events: HashMap<u32, EntityPose>,
    followers: HashMap<u32, EntityPose>,
}

impl SceneSnapshot {
    pub fn clear(&mut self) {
        self.player = None;
        self.events.clear();
        self.followers.clear();
    }

    pub fn insert_player(&mut self, grid: Vec2, screen: Vec2, sprite_height: f32) {
        self.player = Some(EntityPose {
            grid,
            screen,
            sprite_height,
        });
    }

    pub fn insert_event(&mut self, id: u32, grid: Vec2, screen: Vec2, sprite_height: f32) {
        self.events.insert(
            id,
            EntityPose {
                grid,
                screen,
                sprite_height,
            },
        );
    }

    pub fn insert_follower(&mut self, index: u32, grid: Vec2, screen: Vec2, sprite_height: f32) {
        self.followers.insert(
            index,
            EntityPose {
                grid,
                screen,
                sprite_height,
            },
        );
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn remove_event(&mut self, id: u32) {
        self.events.remove(&id);
    }
}

impl EntityLookup for SceneSnapshot {
    fn player(&self) -> Option<EntityPose> {
        self.player
    }

    fn event(&self, id: u32) -> Option<EntityPose> {
        self.events.get(&id).copied()
    }

    fn follower(&self, index: u32) -> Option<EntityPose> {
        self.followers.get(&index).copied()
    }
}
