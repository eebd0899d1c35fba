//! Components and resources for the player character.
use bevy::prelude::*;

/// Marker component identifying the player character.
#[derive(Component, Debug)]
pub struct Player;

/// Resource tracking which event the player could trigger right now.
#[derive(Resource, Default, Debug)]
pub struct PlayerInteractionState {
    pub nearby_event: Option<NearbyEvent>,
}

/// An event within reach of the action button.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyEvent {
    pub event_id: u32,
    pub name: String,
    /// Distance from the player in tiles.
    pub distance: f32,
}
