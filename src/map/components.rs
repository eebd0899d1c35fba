//! Components carried by map characters.
use bevy::prelude::*;

use crate::interpreter::EventCommand;

/// Continuous tile coordinates of a map character.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct GridPosition(pub Vec2);

/// A scripted map event.
#[derive(Component, Debug, Clone)]
pub struct MapEvent {
    pub id: u32,
    pub name: String,
}

/// Party member walking behind the player; index 0 is closest.
#[derive(Component, Debug, Clone, Copy)]
pub struct Follower {
    pub index: u32,
}

/// Drawn sprite height in pixels. Bubbles float above it.
#[derive(Component, Debug, Clone, Copy)]
pub struct SpriteHeight(pub f32);

/// Everything spawned for the current map; despawned on scene exit.
#[derive(Component, Debug, Default)]
pub struct MapEntity;

/// Commands run when the player triggers the event.
#[derive(Component, Debug, Clone, Default)]
pub struct EventScript(pub Vec<EventCommand>);
