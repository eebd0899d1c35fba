//! Shared fixtures for bubble tests.
use std::time::Duration;

use bevy::prelude::*;

use crate::map::{GameVariables, PartyRoster, SceneSnapshot, TextSources};
use crate::text::TextMetrics;

use super::{
    board::BubbleBoard,
    commands::{BubbleStage, SceneContext, ShowBubbleArgs},
    config::BubbleSettings,
    coordinator::VisibilityCoordinator,
    layer::BubbleLayer,
    timers::ExpiryTimers,
    types::BubbleId,
    wait::BubbleWait,
};

/// Single-line metrics with `visible_length` characters of 10px each.
pub fn metrics(visible_length: usize) -> TextMetrics {
    TextMetrics {
        width: u32::try_from(visible_length).unwrap_or(0) * 10,
        height: 36,
        visible_length,
        lines: vec!["x".repeat(visible_length)],
    }
}

/// A scene with the player at the origin and event 1 one tile east, plus all
/// bubble resources with default settings.
pub struct Fixture {
    pub board: BubbleBoard,
    pub coordinator: VisibilityCoordinator,
    pub timers: ExpiryTimers,
    pub wait: BubbleWait,
    pub layer: BubbleLayer,
    pub settings: BubbleSettings,
    pub scene: SceneSnapshot,
    pub variables: GameVariables,
    pub party: PartyRoster,
    /// Model time the fixture's timers have been advanced to.
    pub now_ms: u64,
}

impl Fixture {
    pub fn new() -> Self {
        let mut scene = SceneSnapshot::default();
        scene.insert_player(Vec2::ZERO, Vec2::new(24.0, 42.0), 48.0);
        scene.insert_event(1, Vec2::new(1.0, 0.0), Vec2::new(72.0, 42.0), 48.0);

        Self {
            board: BubbleBoard::default(),
            coordinator: VisibilityCoordinator::default(),
            timers: ExpiryTimers::default(),
            wait: BubbleWait::default(),
            layer: BubbleLayer::default(),
            settings: BubbleSettings::default(),
            scene,
            variables: GameVariables::default(),
            party: PartyRoster::default(),
            now_ms: 0,
        }
    }

    fn with_stage<R>(
        &mut self,
        run: impl FnOnce(&mut BubbleStage<'_>, SceneContext<'_>) -> R,
    ) -> R {
        let text = TextSources::new(&self.variables, &self.party);
        let context = SceneContext {
            scene: &self.scene,
            variables: &self.variables,
            text: &text,
        };
        let mut stage = BubbleStage {
            board: &mut self.board,
            coordinator: &mut self.coordinator,
            timers: &mut self.timers,
            wait: &mut self.wait,
            sink: &mut self.layer,
            settings: &self.settings,
        };
        run(&mut stage, context)
    }

    /// Advances to `now_ms` like a frame would, then shows the bubble.
    pub fn show(&mut self, args: &ShowBubbleArgs, this_event: Option<u32>, now_ms: u64) -> BubbleId {
        self.expire(now_ms);
        self.with_stage(|stage, context| stage.show(args, this_event, context))
    }

    pub fn load_notetags(&mut self, notes: &[(u32, &str)]) -> usize {
        self.with_stage(|stage, context| stage.load_notetags(notes.iter().copied(), context))
    }

    pub fn tick(&mut self) {
        self.with_stage(|stage, context| stage.tick(context.scene));
    }

    /// Ticks lifetimes forward to `now_ms`; earlier times tick by zero.
    pub fn expire(&mut self, now_ms: u64) -> usize {
        let delta = Duration::from_millis(now_ms.saturating_sub(self.now_ms));
        self.now_ms = self.now_ms.max(now_ms);
        self.with_stage(|stage, _| stage.expire_due(delta))
    }

    pub fn teardown(&mut self) {
        self.with_stage(|stage, _| stage.teardown());
    }
}
