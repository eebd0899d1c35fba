//! Systems for the map module.
use bevy::prelude::*;

use crate::player::components::Player;

use super::{
    components::{EventScript, Follower, GridPosition, MapEntity, MapEvent, SpriteHeight},
    data::MapData,
    resources::{CurrentMap, GameVariables, MapViewport, PartyRoster, SceneState},
    snapshot::SceneSnapshot,
};

const CHARACTER_HEIGHT: f32 = 48.0;
const CHARACTER_SIZE: Vec2 = Vec2::new(36.0, CHARACTER_HEIGHT);
const PLAYER_COLOR: Color = Color::srgb(0.25, 0.45, 0.85);
const FOLLOWER_COLOR: Color = Color::srgb(0.35, 0.65, 0.9);
const EVENT_COLOR: Color = Color::srgb(0.85, 0.55, 0.25);

/// Followers keep this many tiles behind whoever they follow.
const FOLLOW_GAP: f32 = 1.0;
const FOLLOW_SPEED: f32 = 4.5;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Loads the pending map (or reloads the current one) and enters it.
pub fn load_pending_map(
    mut current: ResMut<CurrentMap>,
    mut variables: ResMut<GameVariables>,
    mut party: ResMut<PartyRoster>,
    mut next_state: ResMut<NextState<SceneState>>,
) {
    let map_id = current.take_pending().unwrap_or(current.map_id);
    let data = MapData::load_or_fallback(map_id);

    variables.seed(&data.variables);
    if let Some(roster) = &data.party {
        party.apply(roster);
    }

    info!(
        "Loaded map {} '{}' ({}x{}, {} events)",
        map_id,
        data.display_name,
        data.width,
        data.height,
        data.events.len()
    );

    current.map_id = map_id;
    current.data = data;
    next_state.set(SceneState::Map);
}

/// Spawns the player, its followers and every map event.
pub fn spawn_map_entities(
    mut commands: Commands,
    current: Res<CurrentMap>,
    mut viewport: ResMut<MapViewport>,
) {
    let data = &current.data;
    let start = Vec2::new(data.player.x, data.player.y);
    viewport.center_on(start, current.size());

    commands.spawn((
        Player,
        GridPosition(start),
        SpriteHeight(CHARACTER_HEIGHT),
        Sprite::from_color(PLAYER_COLOR, CHARACTER_SIZE),
        Transform::default(),
        MapEntity,
        Name::new("Player"),
    ));

    for index in 0..data.followers {
        commands.spawn((
            Follower { index },
            GridPosition(start),
            SpriteHeight(CHARACTER_HEIGHT),
            Sprite::from_color(FOLLOWER_COLOR, CHARACTER_SIZE),
            Transform::default(),
            MapEntity,
            Name::new(format!("Follower {}", index)),
        ));
    }

    for event in &data.events {
        commands.spawn((
            MapEvent {
                id: event.id,
                name: event.name.clone(),
            },
            EventScript(event.script.clone()),
            GridPosition(Vec2::new(event.x, event.y)),
            SpriteHeight(CHARACTER_HEIGHT),
            Sprite::from_color(EVENT_COLOR, CHARACTER_SIZE),
            Transform::default(),
            MapEntity,
            Name::new(format!("Event {} ({})", event.id, event.name)),
        ));
    }

    debug!(
        "Spawned player, {} follower(s) and {} event(s)",
        data.followers,
        data.events.len()
    );
}

pub fn despawn_map_entities(
    mut commands: Commands,
    mut snapshot: ResMut<SceneSnapshot>,
    query: Query<Entity, With<MapEntity>>,
) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
    snapshot.clear();
}

/// Each follower trails the character in front of it.
pub fn follow_leader(
    time: Res<Time>,
    player: Query<&GridPosition, With<Player>>,
    mut followers: Query<(&Follower, &mut GridPosition), Without<Player>>,
) {
    let Ok(player_position) = player.single() else {
        return;
    };

    let mut ordered: Vec<_> = followers.iter_mut().collect();
    ordered.sort_by_key(|(follower, _)| follower.index);

    let step = FOLLOW_SPEED * time.delta_secs();
    let mut leader = player_position.0;
    for (_, position) in ordered.iter_mut() {
        position.0 = trail(position.0, leader, step);
        leader = position.0;
    }
}

fn trail(position: Vec2, leader: Vec2, step: f32) -> Vec2 {
    let offset = leader - position;
    let distance = offset.length();
    if distance <= FOLLOW_GAP {
        return position;
    }
    let travel = step.min(distance - FOLLOW_GAP);
    position + offset / distance * travel
}

pub fn update_viewport(
    current: Res<CurrentMap>,
    player: Query<&GridPosition, With<Player>>,
    mut viewport: ResMut<MapViewport>,
) {
    if let Ok(position) = player.single() {
        viewport.center_on(position.0, current.size());
    }
}

/// Copies every character's pose into the [`SceneSnapshot`].
pub fn refresh_scene_snapshot(
    viewport: Res<MapViewport>,
    player: Query<(&GridPosition, &SpriteHeight), With<Player>>,
    events: Query<(&MapEvent, &GridPosition, &SpriteHeight)>,
    followers: Query<(&Follower, &GridPosition, &SpriteHeight)>,
    mut snapshot: ResMut<SceneSnapshot>,
) {
    snapshot.clear();

    if let Ok((position, height)) = player.single() {
        snapshot.insert_player(position.0, viewport.project(position.0), height.0);
    }
    for (event, position, height) in events.iter() {
        snapshot.insert_event(event.id, position.0, viewport.project(position.0), height.0);
    }
    for (follower, position, height) in followers.iter() {
        snapshot.insert_follower(
            follower.index,
            position.0,
            viewport.project(position.0),
            height.0,
        );
    }
}

/// Places sprites where the viewport projects them. Lower rows draw in front.
pub fn sync_sprite_transforms(
    viewport: Res<MapViewport>,
    mut query: Query<(&GridPosition, &mut Transform), With<MapEntity>>,
) {
    for (position, mut transform) in query.iter_mut() {
        let feet = viewport.project(position.0);
        let centre = feet - Vec2::new(0.0, CHARACTER_HEIGHT / 2.0);
        transform.translation = viewport.to_world(centre, 1.0 + position.0.y * 0.01);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bubble::EntityLookup;

    #[test]
    fn trail_stops_at_the_gap() {
        let position = trail(Vec2::ZERO, Vec2::new(3.0, 0.0), 10.0);
        assert_eq!(position, Vec2::new(2.0, 0.0));

        let still = trail(Vec2::new(2.5, 0.0), Vec2::new(3.0, 0.0), 10.0);
        assert_eq!(still, Vec2::new(2.5, 0.0));
    }

    #[test]
    fn snapshot_mirrors_spawned_characters() {
        let mut app = App::new();
        app.init_resource::<MapViewport>()
            .init_resource::<SceneSnapshot>()
            .add_systems(Update, refresh_scene_snapshot);

        app.world_mut().spawn((
            Player,
            GridPosition(Vec2::new(2.0, 3.0)),
            SpriteHeight(48.0),
        ));
        app.world_mut().spawn((
            MapEvent {
                id: 5,
                name: "Well".into(),
            },
            GridPosition(Vec2::new(4.0, 3.0)),
            SpriteHeight(64.0),
        ));
        app.world_mut().spawn((
            Follower { index: 0 },
            GridPosition(Vec2::new(2.0, 4.0)),
            SpriteHeight(48.0),
        ));

        app.update();

        let snapshot = app.world().resource::<SceneSnapshot>();
        let event = snapshot.event(5).expect("event 5 in snapshot");
        assert_eq!(event.grid, Vec2::new(4.0, 3.0));
        assert_eq!(event.screen, Vec2::new(216.0, 186.0));
        assert_eq!(event.sprite_height, 64.0);
        assert!(snapshot.player().is_some());
        assert!(snapshot.follower(0).is_some());
        assert!(snapshot.follower(1).is_none());
    }

    #[test]
    fn followers_close_in_on_the_player() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_systems(Update, follow_leader);

        app.world_mut()
            .spawn((Player, GridPosition(Vec2::new(5.0, 0.0))));
        let follower = app
            .world_mut()
            .spawn((Follower { index: 0 }, GridPosition(Vec2::ZERO)))
            .id();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs(10));
        app.update();

        let position = app.world().get::<GridPosition>(follower).expect("follower");
        assert_eq!(position.0, Vec2::new(4.0, 0.0));
    }
}
