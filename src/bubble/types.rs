//! Bubble entity and its geometry.
use std::fmt;

use bevy::prelude::*;

use crate::text::TextMetrics;

use super::target::{EntityLookup, EntityPose, TargetHandle};

/// Unique identifier for a bubble within the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BubbleId(u64);

impl BubbleId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bubble-{}", self.0)
    }
}

/// What created a bubble, which decides what governs its visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    /// Declared on a map event; shown and hidden by player proximity.
    Notetag,
    /// Created by a show command; lives until its expiry timer fires.
    Command,
}

/// Outer bubble size in pixels, padding included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleSize {
    pub width: u32,
    pub height: u32,
}

impl BubbleSize {
    /// Pads the text box on every side and rounds both dimensions up to an
    /// even number of pixels.
    pub fn from_text(text_width: u32, text_height: u32, padding: u32) -> Self {
        let pad = padding.saturating_mul(2);
        Self {
            width: round_up_even(text_width.saturating_add(pad)),
            height: round_up_even(text_height.saturating_add(pad)),
        }
    }
}

fn round_up_even(value: u32) -> u32 {
    value.saturating_add(value % 2)
}

/// A positioned text callout.
///
/// `attached` means the bubble is in the scene's render set and on its
/// target's stack. `visible` is false while a newer bubble for the same target
/// covers it.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub(super) id: BubbleId,
    pub(super) kind: BubbleKind,
    pub(super) target: TargetHandle,
    pub(super) text: String,
    pub(super) lines: Vec<String>,
    pub(super) size: BubbleSize,
    pub(super) visible_length: usize,
    pub(super) attached: bool,
    pub(super) visible: bool,
    pub(super) lost: bool,
    pub(super) position: Vec2,
}

impl Bubble {
    pub fn new(
        id: BubbleId,
        kind: BubbleKind,
        target: TargetHandle,
        text: impl Into<String>,
        metrics: TextMetrics,
        padding: u32,
    ) -> Self {
        Self {
            id,
            kind,
            target,
            text: text.into(),
            size: BubbleSize::from_text(metrics.width, metrics.height, padding),
            visible_length: metrics.visible_length,
            lines: metrics.lines,
            attached: false,
            visible: false,
            lost: false,
            position: Vec2::ZERO,
        }
    }

    pub fn id(&self) -> BubbleId {
        self.id
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn kind(&self) -> BubbleKind {
        self.kind
    }

    /// Source text, control sequences included.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Drawable lines after conversion.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn size(&self) -> BubbleSize {
        self.size
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn visible_length(&self) -> usize {
        self.visible_length
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attached and not covered by a newer bubble on the same target.
    pub fn is_shown(&self) -> bool {
        self.attached && self.visible
    }

    /// Top-left screen position, valid while attached.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Whether the bubble can ever be shown: its target resolved and has not
    /// since disappeared.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_inert(&self) -> bool {
        self.lost || self.target.is_inert()
    }

    /// Top-left corner that centres the bubble above the target's sprite,
    /// `margin` pixels clear of its head.
    pub fn anchor(&self, pose: EntityPose, margin: f32) -> Vec2 {
        Vec2::new(
            pose.screen.x - self.size.width as f32 / 2.0,
            pose.screen.y - pose.sprite_height - self.size.height as f32 - margin,
        )
    }

    /// Squared tile distance between target and player, inclusive of the
    /// `distance` boundary.
    pub fn is_within_proximity(&self, scene: &dyn EntityLookup, distance: f32) -> bool {
        if self.lost {
            return false;
        }
        let Some(target) = self
            .target
            .identity()
            .and_then(|identity| identity.pose_in(scene))
        else {
            return false;
        };
        let Some(player) = scene.player() else {
            return false;
        };
        target.grid.distance_squared(player.grid) <= distance * distance
    }
}
