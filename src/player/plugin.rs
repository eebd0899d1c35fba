//! Player plugin wiring movement and interaction systems.
use bevy::prelude::*;

use crate::{
    core::FrameSet,
    map::SceneState,
    player::{
        components::PlayerInteractionState,
        systems::{
            detect_nearby_events, handle_map_transfer_input, handle_player_interaction_input,
            move_player,
        },
    },
};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInteractionState>().add_systems(
            Update,
            (
                move_player,
                detect_nearby_events.after(move_player),
                handle_player_interaction_input.after(detect_nearby_events),
                handle_map_transfer_input,
            )
                .in_set(FrameSet::Movement)
                .run_if(in_state(SceneState::Map)),
        );
    }
}
