//! Systems for the interpreter module.
use bevy::prelude::*;

use crate::bubble::{BubbleBoard, BubbleWait, ShowBubbleMessage};
use crate::core::FrameClock;

use super::script::MapInterpreter;

/// Polls the wait, then runs commands until the script suspends again.
pub fn run_map_interpreter(
    clock: Res<FrameClock>,
    board: Res<BubbleBoard>,
    wait: Res<BubbleWait>,
    mut interpreter: ResMut<MapInterpreter>,
    mut shows: MessageWriter<ShowBubbleMessage>,
) {
    if !interpreter.is_running() {
        return;
    }

    let bubble_waiting = wait.is_waiting(&board);
    for message in interpreter.update(clock.now_ms(), bubble_waiting) {
        shows.write(message);
    }
}

pub fn clear_map_interpreter(mut interpreter: ResMut<MapInterpreter>) {
    if let Some(event_id) = interpreter.event_id() {
        debug!("Abandoning script of event {} on scene exit", event_id);
    }
    interpreter.clear();
}
