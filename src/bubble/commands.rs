//! Command surface: turns show commands and map notetags into bubbles.
use std::{collections::BTreeMap, time::Duration};

use bevy::prelude::*;

use crate::map::note_value;
use crate::text::{measure_text, TextContext};

use super::{
    board::{BubbleBoard, SceneSink},
    config::BubbleSettings,
    coordinator::VisibilityCoordinator,
    target::{resolve_target, EntityLookup, TargetHandle, TargetIdentity, TargetSelector, VariableSource},
    timers::ExpiryTimers,
    types::{BubbleId, BubbleKind},
    wait::BubbleWait,
};

/// Note tag whose value is a map event's permanent bubble text.
pub const BUBBLE_TAG: &str = "bubble";

/// Validated arguments of a show-bubble command.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowBubbleArgs {
    pub text: String,
    pub selector: TargetSelector,
    /// Display time; 0 derives it from the visible character count.
    pub duration_ms: u64,
    /// Hold the issuing script until the bubble detaches.
    pub blocking: bool,
}

impl ShowBubbleArgs {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn new(text: impl Into<String>, selector: TargetSelector) -> Self {
        Self {
            text: text.into(),
            selector,
            duration_ms: 0,
            blocking: false,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// Reads the raw string arguments a script passes (`text`, `target`, `id`,
    /// `duration`, `wait`). Malformed numbers read as 0 and malformed flags as
    /// false. A missing target means the issuing event.
    pub fn from_plugin_args(args: &BTreeMap<String, String>) -> Self {
        let arg = |key: &str| args.get(key).map(|value| value.trim()).unwrap_or_default();
        let id = arg("id").parse::<i64>().unwrap_or(0);
        let duration_ms = arg("duration")
            .parse::<i64>()
            .ok()
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0);
        let blocking = matches!(
            arg("wait").to_ascii_lowercase().as_str(),
            "true" | "1" | "on" | "yes"
        );

        let selector = match arg("target") {
            "" => TargetSelector::ThisEvent,
            kind => TargetSelector::from_command(kind, id),
        };

        Self {
            text: args.get("text").cloned().unwrap_or_default(),
            selector,
            duration_ms,
            blocking,
        }
    }
}

/// Sent by the interpreter when a script reaches a show-bubble command.
#[derive(Message, Debug, Clone)]
pub struct ShowBubbleMessage {
    pub args: ShowBubbleArgs,
    /// Event running the script, for the this-event selector.
    pub this_event: Option<u32>,
}

/// Read-only host state bubbles are built against.
#[derive(Clone, Copy)]
pub struct SceneContext<'a> {
    pub scene: &'a dyn EntityLookup,
    pub variables: &'a dyn VariableSource,
    pub text: &'a dyn TextContext,
}

/// Mutable bubble state of the scene, borrowed together for one operation.
pub struct BubbleStage<'a> {
    pub board: &'a mut BubbleBoard,
    pub coordinator: &'a mut VisibilityCoordinator,
    pub timers: &'a mut ExpiryTimers,
    pub wait: &'a mut BubbleWait,
    pub sink: &'a mut dyn SceneSink,
    pub settings: &'a BubbleSettings,
}

impl BubbleStage<'_> {
    /// Creates a command bubble and attaches it right away; proximity does not
    /// apply. It expires after the given duration, or after
    /// `ms_per_character` per visible character when the duration is 0.
    pub fn show(
        &mut self,
        args: &ShowBubbleArgs,
        this_event: Option<u32>,
        context: SceneContext<'_>,
    ) -> BubbleId {
        let target = resolve_target(args.selector, this_event, context.scene, context.variables);
        if target.is_inert() {
            debug!(
                target: "bubble",
                "show target {:?} did not resolve; bubble will stay hidden",
                args.selector
            );
        }

        let metrics = measure_text(&args.text, context.text, &self.settings.glyphs());
        let duration_ms = if args.duration_ms == 0 {
            self.settings.auto_duration_ms(metrics.visible_length)
        } else {
            args.duration_ms
        };
        let id = self.board.create(
            BubbleKind::Command,
            target,
            args.text.clone(),
            metrics,
            self.settings.padding,
        );

        self.board
            .attach(id, context.scene, &mut *self.sink, self.settings.margin);
        self.timers.schedule(id, duration_ms);
        if args.blocking {
            self.wait.track(id);
        }
        id
    }

    /// Creates one proximity-gated bubble per event whose note carries a
    /// `bubble` tag. Literal `\n` pairs in the tag value become line breaks.
    pub fn load_notetags<'n>(
        &mut self,
        notes: impl IntoIterator<Item = (u32, &'n str)>,
        context: SceneContext<'_>,
    ) -> usize {
        let glyphs = self.settings.glyphs();
        let mut created = 0;
        for (event_id, note) in notes {
            let Some(raw) = note_value(note, BUBBLE_TAG) else {
                continue;
            };
            let text = raw.replace("\\n", "\n");
            let metrics = measure_text(&text, context.text, &glyphs);
            let id = self.board.create(
                BubbleKind::Notetag,
                TargetHandle::Live(TargetIdentity::Event(event_id)),
                text,
                metrics,
                self.settings.padding,
            );
            self.coordinator.track(id);
            created += 1;
        }
        created
    }

    /// Runs the visibility coordinator for this frame.
    pub fn tick(&mut self, scene: &dyn EntityLookup) {
        self.coordinator.tick(
            self.board,
            scene,
            &mut *self.sink,
            self.settings.distance,
            self.settings.margin,
        );
    }

    /// Advances command bubble lifetimes by `delta` of model time, then
    /// detaches and drops the bubbles whose lifetime ran out.
    pub fn expire_due(&mut self, delta: Duration) -> usize {
        let due = self.timers.tick(delta);
        for id in &due {
            self.board.remove(*id, &mut *self.sink);
        }
        due.len()
    }

    /// Scene exit: drops notetag bubbles, cancels pending expiries and
    /// releases the wait. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.coordinator.teardown(self.board, &mut *self.sink);
        for id in self.timers.drain() {
            self.board.remove(id, &mut *self.sink);
        }
        self.board.clear(&mut *self.sink);
        self.wait.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::test_support::Fixture;

    fn plugin_args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn plugin_args_are_validated_at_the_boundary() {
        let args = ShowBubbleArgs::from_plugin_args(&plugin_args(&[
            ("text", "Hi there"),
            ("target", "follower"),
            ("id", " 1 "),
            ("duration", "2500"),
            ("wait", "true"),
        ]));
        assert_eq!(args.selector, TargetSelector::Follower(1));
        assert_eq!(args.duration_ms, 2500);
        assert!(args.blocking);

        let sloppy = ShowBubbleArgs::from_plugin_args(&plugin_args(&[
            ("target", "4"),
            ("duration", "-20"),
            ("wait", "maybe"),
        ]));
        assert_eq!(sloppy.selector, TargetSelector::Event(4));
        assert_eq!(sloppy.duration_ms, 0);
        assert!(!sloppy.blocking);
        assert_eq!(sloppy.text, "");

        let bare = ShowBubbleArgs::from_plugin_args(&plugin_args(&[("text", "Hm")]));
        assert_eq!(bare.selector, TargetSelector::ThisEvent);
    }

    #[test]
    fn auto_duration_expires_exactly_on_time() {
        let mut fixture = Fixture::new();
        let args = ShowBubbleArgs::new("0123456789", TargetSelector::Player);
        let id = fixture.show(&args, None, 0);
        assert!(fixture.board.is_shown(id));

        assert_eq!(fixture.expire(1499), 0);
        assert!(fixture.board.is_attached(id));

        assert_eq!(fixture.expire(1500), 1);
        assert!(!fixture.board.is_attached(id));
        assert!(fixture.board.get(id).is_none());
        assert!(fixture.layer.is_empty());
    }

    #[test]
    fn explicit_duration_overrides_auto_duration() {
        let mut fixture = Fixture::new();
        let args = ShowBubbleArgs::new("0123456789", TargetSelector::Player).with_duration(400);
        let id = fixture.show(&args, None, 1000);

        fixture.expire(1399);
        assert!(fixture.board.is_attached(id));
        fixture.expire(1400);
        assert!(!fixture.board.is_attached(id));
    }

    #[test]
    fn command_bubbles_ignore_proximity() {
        let mut fixture = Fixture::new();
        fixture.scene.insert_event(9, Vec2::new(30.0, 30.0), Vec2::ZERO, 48.0);
        let args = ShowBubbleArgs::new("far away", TargetSelector::Event(9));
        let id = fixture.show(&args, None, 0);
        fixture.tick();
        assert!(fixture.board.is_shown(id));
    }

    #[test]
    fn blocking_show_waits_until_expiry() {
        let mut fixture = Fixture::new();
        let args = ShowBubbleArgs::new("Move along", TargetSelector::ThisEvent).blocking();
        let id = fixture.show(&args, Some(1), 0);

        assert_eq!(fixture.wait.tracked(), Some(id));
        assert!(fixture.wait.is_waiting(&fixture.board));

        fixture.expire(1499);
        assert!(fixture.wait.is_waiting(&fixture.board));
        fixture.expire(1500);
        assert!(!fixture.wait.is_waiting(&fixture.board));
    }

    #[test]
    fn second_blocking_show_takes_over_the_wait() {
        let mut fixture = Fixture::new();
        let first = fixture.show(
            &ShowBubbleArgs::new("first", TargetSelector::Player)
                .with_duration(5000)
                .blocking(),
            None,
            0,
        );
        let second = fixture.show(
            &ShowBubbleArgs::new("second", TargetSelector::Event(1))
                .with_duration(1000)
                .blocking(),
            None,
            0,
        );
        assert_eq!(fixture.wait.tracked(), Some(second));

        fixture.expire(1000);
        assert!(!fixture.wait.is_waiting(&fixture.board));
        assert!(fixture.board.is_attached(first));

        fixture.expire(5000);
        assert!(!fixture.board.is_attached(first));
    }

    #[test]
    fn unresolvable_target_never_blocks_or_shows() {
        let mut fixture = Fixture::new();
        let args = ShowBubbleArgs::new("nobody", TargetSelector::Follower(-1)).blocking();
        let id = fixture.show(&args, None, 0);
        fixture.tick();

        assert!(!fixture.board.is_attached(id));
        assert!(!fixture.wait.is_waiting(&fixture.board));
        assert_eq!(fixture.expire(1000), 1);
    }

    #[test]
    fn notetags_become_tracked_bubbles_with_line_breaks() {
        let mut fixture = Fixture::new();
        let created = fixture.load_notetags(&[
            (1, r"<bubble:Fresh apples\nfive each>"),
            (2, "<face:smile>"),
            (3, ""),
        ]);
        assert_eq!(created, 1);

        let id = fixture.coordinator.tracked()[0];
        let bubble = fixture.board.get(id).expect("notetag bubble");
        assert_eq!(bubble.text(), "Fresh apples\nfive each");
        assert_eq!(bubble.lines().len(), 2);
        assert_eq!(bubble.kind(), BubbleKind::Notetag);
        assert!(!bubble.is_attached());
    }

    #[test]
    fn teardown_discards_everything_and_is_repeatable() {
        let mut fixture = Fixture::new();
        fixture.load_notetags(&[(1, "<bubble:hello>")]);
        fixture.tick();
        let pending = fixture.show(
            &ShowBubbleArgs::new("pending", TargetSelector::Player).blocking(),
            None,
            0,
        );
        assert_eq!(fixture.board.attached_count(), 2);

        fixture.teardown();
        fixture.teardown();
        fixture.tick();

        assert_eq!(fixture.board.len(), 0);
        assert_eq!(fixture.board.attached_count(), 0);
        assert!(fixture.coordinator.tracked().is_empty());
        assert!(fixture.timers.is_empty());
        assert!(fixture.layer.is_empty());
        assert!(!fixture.board.is_attached(pending));
        assert_eq!(fixture.wait.tracked(), None);
    }
}
