//! Event scripts and the interpreter that steps through them.
use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::bubble::{ShowBubbleArgs, ShowBubbleMessage};

/// One command in a map event's script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EventCommand {
    /// Plugin command with raw string arguments (`text`, `target`, `id`,
    /// `duration`, `wait`).
    ShowBubble {
        #[serde(default)]
        args: BTreeMap<String, String>,
    },
    Wait {
        ms: u64,
    },
    /// Raw script source. Accepted and logged, never evaluated.
    Script {
        source: String,
    },
}

impl EventCommand {
    pub fn show_bubble(args: &[(&str, &str)]) -> Self {
        Self::ShowBubble {
            args: args
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// What the interpreter is waiting on before it executes the next command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    #[default]
    None,
    /// Until the tracked blocking bubble detaches.
    Bubble,
    /// Until model time reaches the deadline.
    Timer { until_ms: u64 },
}

/// Runs one event script at a time.
#[derive(Resource, Debug, Default)]
pub struct MapInterpreter {
    event_id: Option<u32>,
    commands: Vec<EventCommand>,
    index: usize,
    wait_mode: WaitMode,
}

impl MapInterpreter {
    /// Starts `commands` on behalf of `event_id`. Ignored while another
    /// script is running.
    pub fn setup(&mut self, event_id: u32, commands: Vec<EventCommand>) -> bool {
        if self.is_running() {
            return false;
        }
        self.event_id = Some(event_id);
        self.commands = commands;
        self.index = 0;
        self.wait_mode = WaitMode::None;
        true
    }

    pub fn is_running(&self) -> bool {
        self.event_id.is_some()
    }

    pub fn event_id(&self) -> Option<u32> {
        self.event_id
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn wait_mode(&self) -> WaitMode {
        self.wait_mode
    }

    /// Advances the script until it has to wait or runs out of commands.
    ///
    /// `bubble_waiting` is the blocking synchronizer's answer for this frame.
    /// Show commands come back as messages for the bubble systems to handle.
    pub fn update(&mut self, now_ms: u64, bubble_waiting: bool) -> Vec<ShowBubbleMessage> {
        let mut shows = Vec::new();
        let Some(event_id) = self.event_id else {
            return shows;
        };
        if self.is_waiting(now_ms, bubble_waiting) {
            return shows;
        }

        while let Some(command) = self.commands.get(self.index).cloned() {
            self.index += 1;
            match command {
                EventCommand::ShowBubble { args } => {
                    let args = ShowBubbleArgs::from_plugin_args(&args);
                    let blocking = args.blocking;
                    shows.push(ShowBubbleMessage {
                        args,
                        this_event: Some(event_id),
                    });
                    if blocking {
                        self.wait_mode = WaitMode::Bubble;
                        return shows;
                    }
                }
                EventCommand::Wait { ms } => {
                    self.wait_mode = WaitMode::Timer {
                        until_ms: now_ms.saturating_add(ms),
                    };
                    return shows;
                }
                EventCommand::Script { source } => {
                    info!("Event {} script command not evaluated: {}", event_id, source);
                }
            }
        }

        debug!("Event {} script finished", event_id);
        self.clear();
        shows
    }

    /// Drops the running script, e.g. when the scene is left.
    pub fn clear(&mut self) {
        self.event_id = None;
        self.commands.clear();
        self.index = 0;
        self.wait_mode = WaitMode::None;
    }

    fn is_waiting(&mut self, now_ms: u64, bubble_waiting: bool) -> bool {
        let waiting = match self.wait_mode {
            WaitMode::None => false,
            WaitMode::Bubble => bubble_waiting,
            WaitMode::Timer { until_ms } => now_ms < until_ms,
        };
        if !waiting {
            self.wait_mode = WaitMode::None;
        }
        waiting
    }
}
