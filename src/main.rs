use bevy::prelude::*;

mod bubble;
mod core;
mod interpreter;
mod map;
mod player;
mod text;

use crate::{
    bubble::BubblePlugin, core::CorePlugin, interpreter::InterpreterPlugin, map::MapPlugin,
    player::PlayerPlugin,
};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Overhead Bubbles".into(),
                        resolution: (816, 624).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(bevy::log::LogPlugin {
                    level: bevy::log::Level::INFO,
                    filter: "wgpu=error,naga=warn,bubble=info".to_string(),
                    ..default()
                }),
            CorePlugin::default(),
            MapPlugin,
            PlayerPlugin,
            InterpreterPlugin,
            BubblePlugin, // After MapPlugin so SceneState is registered
        ))
        .run();
}
