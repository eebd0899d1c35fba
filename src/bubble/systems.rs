// src/bubble/systems.rs
//
// Systems driving bubble expiry, visibility, command handling and rendering.

use bevy::{ecs::system::SystemParam, prelude::*, text::LineHeight};

use crate::core::FrameClock;
use crate::map::{CurrentMap, GameVariables, PartyRoster, SceneSnapshot, TextSources};

use super::{
    board::BubbleBoard,
    commands::{BubbleStage, SceneContext, ShowBubbleMessage},
    config::BubbleSettings,
    coordinator::VisibilityCoordinator,
    layer::{BubbleLayer, BubbleNode, BubbleNodes, BubbleUiRoot},
    timers::ExpiryTimers,
    wait::BubbleWait,
};

// Visual constants
const BACKGROUND_COLOR: Color = Color::srgba(0.98, 0.98, 0.95, 0.92);
const TEXT_COLOR: Color = Color::srgb(0.1, 0.1, 0.12);

/// Every mutable bubble resource, borrowed as one [`BubbleStage`].
#[derive(SystemParam)]
pub struct BubbleResources<'w> {
    board: ResMut<'w, BubbleBoard>,
    coordinator: ResMut<'w, VisibilityCoordinator>,
    timers: ResMut<'w, ExpiryTimers>,
    wait: ResMut<'w, BubbleWait>,
    layer: ResMut<'w, BubbleLayer>,
    settings: Res<'w, BubbleSettings>,
}

impl BubbleResources<'_> {
    pub fn stage(&mut self) -> BubbleStage<'_> {
        BubbleStage {
            board: &mut *self.board,
            coordinator: &mut *self.coordinator,
            timers: &mut *self.timers,
            wait: &mut *self.wait,
            sink: &mut *self.layer,
            settings: &*self.settings,
        }
    }
}

/// Set up the UI root node that holds all bubbles.
///
/// A full-screen transparent overlay, so bubbles render on top of the map.
pub fn setup_bubble_root(mut commands: Commands) {
    let root = commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .insert(ZIndex(100))
        .insert(BackgroundColor(Color::NONE))
        .id();

    commands.insert_resource(BubbleUiRoot(root));
    info!("Bubble UI root created");
}

/// Creates notetag bubbles for the map that was just entered.
pub fn load_notetag_bubbles(
    current: Res<CurrentMap>,
    variables: Res<GameVariables>,
    party: Res<PartyRoster>,
    scene: Res<SceneSnapshot>,
    mut bubbles: BubbleResources,
) {
    let text = TextSources::new(&variables, &party);
    let context = SceneContext {
        scene: &*scene,
        variables: &*variables,
        text: &text,
    };
    let notes = current
        .data
        .events
        .iter()
        .map(|event| (event.id, event.note.as_str()));

    let created = bubbles.stage().load_notetags(notes, context);
    info!(
        target: "bubble",
        "Loaded {} notetag bubble(s) for map {}",
        created, current.map_id
    );
}

/// Scene exit: drops every bubble of the map being left.
pub fn teardown_bubbles(mut bubbles: BubbleResources) {
    bubbles.stage().teardown();
    debug!(target: "bubble", "Bubble state torn down");
}

/// Ticks command bubble lifetimes with this frame's model time.
pub fn expire_command_bubbles(clock: Res<FrameClock>, mut bubbles: BubbleResources) {
    let expired = bubbles.stage().expire_due(clock.last_scaled_delta());
    if expired > 0 {
        debug!(target: "bubble", "{} command bubble(s) expired at {}ms", expired, clock.now_ms());
    }
}

/// Moves attached bubbles with their targets and applies the proximity policy
/// to notetag bubbles.
pub fn run_visibility_coordinator(scene: Res<SceneSnapshot>, mut bubbles: BubbleResources) {
    bubbles.stage().tick(&*scene);
}

/// Creates command bubbles for show commands issued by scripts this frame.
pub fn handle_show_bubble_messages(
    mut messages: MessageReader<ShowBubbleMessage>,
    scene: Res<SceneSnapshot>,
    variables: Res<GameVariables>,
    party: Res<PartyRoster>,
    mut bubbles: BubbleResources,
) {
    let text = TextSources::new(&variables, &party);
    let context = SceneContext {
        scene: &*scene,
        variables: &*variables,
        text: &text,
    };

    for message in messages.read() {
        let id = bubbles
            .stage()
            .show(&message.args, message.this_event, context);
        debug!(
            target: "bubble",
            "Showing {} for {:?} (blocking: {})",
            id, message.args.selector, message.args.blocking
        );
    }
}

/// Mirrors the layer's render set into absolutely positioned UI nodes.
pub fn render_bubble_layer(
    mut commands: Commands,
    mut layer: ResMut<BubbleLayer>,
    mut nodes: ResMut<BubbleNodes>,
    root: Res<BubbleUiRoot>,
    settings: Res<BubbleSettings>,
    mut node_query: Query<&mut Node, With<BubbleNode>>,
) {
    let (removed, changed) = layer.take_changes();

    for id in removed {
        if let Some(entity) = nodes.by_bubble.remove(&id) {
            commands.entity(entity).despawn();
        }
    }

    for (id, entry) in changed {
        let display = if entry.visible {
            Display::Flex
        } else {
            Display::None
        };

        if let Some(&entity) = nodes.by_bubble.get(&id) {
            if let Ok(mut node) = node_query.get_mut(entity) {
                node.left = Val::Px(entry.position.x);
                node.top = Val::Px(entry.position.y);
                node.display = display;
            }
            continue;
        }

        let entity = commands
            .spawn((
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(entry.position.x),
                    top: Val::Px(entry.position.y),
                    width: Val::Px(entry.size.width as f32),
                    height: Val::Px(entry.size.height as f32),
                    padding: UiRect::all(Val::Px(settings.padding as f32)),
                    display,
                    ..default()
                },
                BackgroundColor(BACKGROUND_COLOR),
                ZIndex(101),
                Text::new(entry.text),
                TextFont {
                    font_size: settings.font_size,
                    line_height: LineHeight::Px(settings.line_height as f32),
                    ..default()
                },
                TextColor(TEXT_COLOR),
                BubbleNode { id },
            ))
            .id();

        commands.entity(root.0).add_child(entity);
        nodes.by_bubble.insert(id, entity);
    }
}
