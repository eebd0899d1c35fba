use bevy::prelude::*;

use crate::core::FrameSet;
use crate::map::SceneState;

use super::{
    board::BubbleBoard,
    commands::ShowBubbleMessage,
    config::BubbleSettings,
    coordinator::VisibilityCoordinator,
    layer::{BubbleLayer, BubbleNodes},
    systems::{
        expire_command_bubbles, handle_show_bubble_messages, load_notetag_bubbles,
        render_bubble_layer, run_visibility_coordinator, setup_bubble_root, teardown_bubbles,
    },
    timers::ExpiryTimers,
    wait::BubbleWait,
};

/// Speech bubbles over map characters.
///
/// Expiry runs before the visibility pass so a notetag covered by an expiring
/// command bubble reappears in the same frame. Show commands are handled after
/// the interpreter has run.
pub struct BubblePlugin;

impl Plugin for BubblePlugin {
    fn build(&self, app: &mut App) {
        let settings = BubbleSettings::load_or_default();
        info!(
            target: "bubble",
            "Bubble settings: distance {:.1} tiles | {}ms per character | padding {}px",
            settings.distance, settings.ms_per_character, settings.padding
        );

        app.insert_resource(settings)
            .init_resource::<BubbleBoard>()
            .init_resource::<VisibilityCoordinator>()
            .init_resource::<ExpiryTimers>()
            .init_resource::<BubbleWait>()
            .init_resource::<BubbleLayer>()
            .init_resource::<BubbleNodes>()
            .add_message::<ShowBubbleMessage>()
            .add_systems(Startup, setup_bubble_root)
            .add_systems(OnEnter(SceneState::Map), load_notetag_bubbles)
            .add_systems(OnExit(SceneState::Map), teardown_bubbles)
            .add_systems(
                Update,
                (
                    expire_command_bubbles.in_set(FrameSet::Expire),
                    run_visibility_coordinator.in_set(FrameSet::Coordinate),
                    handle_show_bubble_messages.in_set(FrameSet::Command),
                )
                    .run_if(in_state(SceneState::Map)),
            )
            .add_systems(Update, render_bubble_layer.in_set(FrameSet::Render));
    }
}
