//! Systems for player movement and event triggering.
use bevy::prelude::*;

use crate::{
    interpreter::MapInterpreter,
    map::{
        components::{EventScript, GridPosition, MapEvent},
        CurrentMap, SceneState,
    },
    player::components::{NearbyEvent, Player, PlayerInteractionState},
};

/// Maximum distance (in tiles) at which the action button reaches an event.
const INTERACTION_RANGE: f32 = 1.5;
/// Walking speed in tiles per second.
const PLAYER_SPEED: f32 = 4.0;

/// Moves the player with the arrow keys or WASD. Frozen while a script runs.
pub fn move_player(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    interpreter: Res<MapInterpreter>,
    current: Res<CurrentMap>,
    mut query: Query<&mut GridPosition, With<Player>>,
) {
    if interpreter.is_running() {
        return;
    }
    let Ok(mut position) = query.single_mut() else {
        return;
    };

    let mut direction = Vec2::ZERO;
    if keyboard.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]) {
        direction.y -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]) {
        direction.y += 1.0;
    }
    if keyboard.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]) {
        direction.x -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]) {
        direction.x += 1.0;
    }
    if direction == Vec2::ZERO {
        return;
    }

    let bounds = (current.size().as_vec2() - Vec2::ONE).max(Vec2::ZERO);
    let moved = position.0 + direction.normalize() * PLAYER_SPEED * time.delta_secs();
    position.0 = moved.clamp(Vec2::ZERO, bounds);
}

/// Detects the event closest to the player within interaction range.
pub fn detect_nearby_events(
    player_query: Query<&GridPosition, With<Player>>,
    event_query: Query<(&GridPosition, &MapEvent)>,
    mut interaction_state: ResMut<PlayerInteractionState>,
) {
    let Ok(player_position) = player_query.single() else {
        interaction_state.nearby_event = None;
        return;
    };

    let mut nearest: Option<(&MapEvent, f32)> = None;
    for (position, event) in event_query.iter() {
        let distance = player_position.0.distance(position.0);
        if distance > INTERACTION_RANGE {
            continue;
        }
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((event, distance));
        }
    }

    interaction_state.nearby_event = nearest.map(|(event, distance)| NearbyEvent {
        event_id: event.id,
        name: event.name.clone(),
        distance,
    });
}

/// Starts the nearby event's script when the action key is pressed.
pub fn handle_player_interaction_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    interaction_state: Res<PlayerInteractionState>,
    scripts: Query<(&MapEvent, &EventScript)>,
    mut interpreter: ResMut<MapInterpreter>,
) {
    if !keyboard.any_just_pressed([KeyCode::KeyE, KeyCode::Enter]) {
        return;
    }
    if interpreter.is_running() {
        return;
    }

    let Some(nearby) = interaction_state.nearby_event.as_ref() else {
        debug!("Player pressed action but no event nearby");
        return;
    };
    let Some((_, script)) = scripts
        .iter()
        .find(|(event, _)| event.id == nearby.event_id)
    else {
        return;
    };
    if script.0.is_empty() {
        debug!("Event {} ({}) has no script", nearby.event_id, nearby.name);
        return;
    }

    interpreter.setup(nearby.event_id, script.0.clone());
    info!(
        "Player triggers {} (event {}, distance: {:.1})",
        nearby.name, nearby.event_id, nearby.distance
    );
}

/// Leaves the current map for its `next_map` (or reloads it) on `T`.
pub fn handle_map_transfer_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    interpreter: Res<MapInterpreter>,
    mut current: ResMut<CurrentMap>,
    mut next_state: ResMut<NextState<SceneState>>,
) {
    if !keyboard.just_pressed(KeyCode::KeyT) || interpreter.is_running() {
        return;
    }

    let destination = current.data.next_map.unwrap_or(current.map_id);
    info!("Transferring from map {} to map {}", current.map_id, destination);
    current.request_transfer(destination);
    next_state.set(SceneState::Loading);
}
