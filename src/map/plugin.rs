//! MapPlugin loads map data and keeps the scene snapshot current.
use bevy::prelude::*;

use crate::core::FrameSet;

use super::{
    resources::{CurrentMap, GameVariables, MapViewport, PartyRoster, SceneState},
    snapshot::SceneSnapshot,
    systems::{
        despawn_map_entities, follow_leader, load_pending_map, refresh_scene_snapshot,
        spawn_camera, spawn_map_entities, sync_sprite_transforms, update_viewport,
    },
};

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SceneState>()
            .init_resource::<CurrentMap>()
            .init_resource::<GameVariables>()
            .init_resource::<PartyRoster>()
            .init_resource::<MapViewport>()
            .init_resource::<SceneSnapshot>()
            .add_systems(Startup, spawn_camera)
            .add_systems(OnEnter(SceneState::Loading), load_pending_map)
            .add_systems(OnEnter(SceneState::Map), spawn_map_entities)
            .add_systems(OnExit(SceneState::Map), despawn_map_entities)
            .add_systems(
                Update,
                (follow_leader, update_viewport, refresh_scene_snapshot)
                    .chain()
                    .in_set(FrameSet::Snapshot)
                    .run_if(in_state(SceneState::Map)),
            )
            .add_systems(
                Update,
                sync_sprite_transforms
                    .in_set(FrameSet::Render)
                    .run_if(in_state(SceneState::Map)),
            );
    }
}
