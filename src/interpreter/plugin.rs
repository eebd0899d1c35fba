use bevy::prelude::*;

use crate::core::FrameSet;
use crate::map::SceneState;

use super::{
    script::MapInterpreter,
    systems::{clear_map_interpreter, run_map_interpreter},
};

pub struct InterpreterPlugin;

impl Plugin for InterpreterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapInterpreter>()
            .add_systems(OnExit(SceneState::Map), clear_map_interpreter)
            .add_systems(
                Update,
                run_map_interpreter
                    .in_set(FrameSet::Interpret)
                    .run_if(in_state(SceneState::Map)),
            );
    }
}
