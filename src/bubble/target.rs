//! Target selection: which on-map entity a bubble is anchored to.
use std::fmt;

use bevy::prelude::*;

/// Where an entity stands this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPose {
    /// Continuous tile coordinates, used for proximity.
    pub grid: Vec2,
    /// Screen pixel position of the entity's feet, horizontally centred.
    pub screen: Vec2,
    /// Drawn height of the entity's sprite in pixels.
    pub sprite_height: f32,
}

/// Read access to the live entities of the current scene.
pub trait EntityLookup {
    fn player(&self) -> Option<EntityPose>;

    fn event(&self, id: u32) -> Option<EntityPose>;

    /// Follower at 0-based `index` behind the player.
    fn follower(&self, index: u32) -> Option<EntityPose>;
}

/// Read access to numeric game variables.
pub trait VariableSource {
    fn variable(&self, slot: usize) -> i32;
}

/// Stable key for the entity a bubble is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetIdentity {
    Player,
    Event(u32),
    Follower(u32),
}

impl TargetIdentity {
    /// Looks the entity up in the live scene.
    pub fn pose_in(self, scene: &dyn EntityLookup) -> Option<EntityPose> {
        match self {
            Self::Player => scene.player(),
            Self::Event(id) => scene.event(id),
            Self::Follower(index) => scene.follower(index),
        }
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Event(id) => write!(f, "event:{}", id),
            Self::Follower(index) => write!(f, "follower:{}", index),
        }
    }
}

/// How a show command names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// The event running the script that issued the command.
    ThisEvent,
    Player,
    Event(i64),
    /// Event whose id is stored in the given variable slot.
    EventByVariable(i64),
    Follower(i64),
    /// Follower whose index is stored in the given variable slot.
    FollowerByVariable(i64),
}

impl TargetSelector {
    /// Builds a selector from a raw command `kind` and numeric `id`.
    ///
    /// An unrecognised kind is read as a literal event id.
    pub fn from_command(kind: &str, id: i64) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "this" | "this_event" => Self::ThisEvent,
            "player" => Self::Player,
            "event" => Self::Event(id),
            "event_variable" | "event_by_variable" => Self::EventByVariable(id),
            "follower" => Self::Follower(id),
            "follower_variable" | "follower_by_variable" => Self::FollowerByVariable(id),
            literal => Self::Event(literal.parse().unwrap_or(0)),
        }
    }
}

/// A bubble's reference to its target. The bubble never owns the entity; it
/// looks the identity up again every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHandle {
    Live(TargetIdentity),
    /// Resolution failed. The bubble exists but never attaches.
    Inert,
}

impl TargetHandle {
    pub fn identity(self) -> Option<TargetIdentity> {
        match self {
            Self::Live(identity) => Some(identity),
            Self::Inert => None,
        }
    }

    pub fn is_inert(self) -> bool {
        matches!(self, Self::Inert)
    }
}

/// Resolves `selector` against the live scene. Anything that does not name an
/// existing entity resolves to [`TargetHandle::Inert`].
pub fn resolve_target(
    selector: TargetSelector,
    this_event: Option<u32>,
    scene: &dyn EntityLookup,
    variables: &dyn VariableSource,
) -> TargetHandle {
    let identity = match selector {
        TargetSelector::ThisEvent => this_event.map(TargetIdentity::Event),
        TargetSelector::Player => Some(TargetIdentity::Player),
        TargetSelector::Event(id) => index_of(id).map(TargetIdentity::Event),
        TargetSelector::EventByVariable(slot) => {
            index_of(read_slot(variables, slot)).map(TargetIdentity::Event)
        }
        TargetSelector::Follower(index) => index_of(index).map(TargetIdentity::Follower),
        TargetSelector::FollowerByVariable(slot) => {
            index_of(read_slot(variables, slot)).map(TargetIdentity::Follower)
        }
    };

    match identity {
        Some(identity) if identity.pose_in(scene).is_some() => TargetHandle::Live(identity),
        _ => TargetHandle::Inert,
    }
}

fn index_of(value: i64) -> Option<u32> {
    u32::try_from(value).ok()
}

fn read_slot(variables: &dyn VariableSource, slot: i64) -> i64 {
    usize::try_from(slot)
        .map(|slot| i64::from(variables.variable(slot)))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GameVariables, SceneSnapshot};

    fn scene() -> SceneSnapshot {
        let mut scene = SceneSnapshot::default();
        scene.insert_player(Vec2::new(5.0, 5.0), Vec2::new(240.0, 282.0), 48.0);
        scene.insert_event(7, Vec2::new(6.0, 5.0), Vec2::new(288.0, 282.0), 48.0);
        scene.insert_follower(0, Vec2::new(5.0, 6.0), Vec2::new(240.0, 330.0), 48.0);
        scene
    }

    fn variables() -> GameVariables {
        let mut variables = GameVariables::default();
        variables.set(3, 7);
        variables.set(4, 0);
        variables.set(5, -2);
        variables
    }

    #[test]
    fn identities_render_stable_keys() {
        assert_eq!(TargetIdentity::Player.to_string(), "player");
        assert_eq!(TargetIdentity::Event(7).to_string(), "event:7");
        assert_eq!(TargetIdentity::Follower(0).to_string(), "follower:0");
    }

    #[test]
    fn selector_kinds_parse_with_literal_fallback() {
        assert_eq!(TargetSelector::from_command("this", 3), TargetSelector::ThisEvent);
        assert_eq!(TargetSelector::from_command(" Player ", 0), TargetSelector::Player);
        assert_eq!(
            TargetSelector::from_command("follower_variable", 4),
            TargetSelector::FollowerByVariable(4)
        );
        assert_eq!(TargetSelector::from_command("12", 0), TargetSelector::Event(12));
        assert_eq!(TargetSelector::from_command("gibberish", 9), TargetSelector::Event(0));
    }

    #[test]
    fn resolves_every_selector_kind() {
        let scene = scene();
        let variables = variables();
        let resolve = |selector| resolve_target(selector, Some(7), &scene, &variables);

        assert_eq!(
            resolve(TargetSelector::ThisEvent),
            TargetHandle::Live(TargetIdentity::Event(7))
        );
        assert_eq!(
            resolve(TargetSelector::Player),
            TargetHandle::Live(TargetIdentity::Player)
        );
        assert_eq!(
            resolve(TargetSelector::Event(7)),
            TargetHandle::Live(TargetIdentity::Event(7))
        );
        assert_eq!(
            resolve(TargetSelector::EventByVariable(3)),
            TargetHandle::Live(TargetIdentity::Event(7))
        );
        assert_eq!(
            resolve(TargetSelector::Follower(0)),
            TargetHandle::Live(TargetIdentity::Follower(0))
        );
        assert_eq!(
            resolve(TargetSelector::FollowerByVariable(4)),
            TargetHandle::Live(TargetIdentity::Follower(0))
        );
    }

    #[test]
    fn out_of_range_targets_are_inert() {
        let scene = scene();
        let variables = variables();
        let resolve = |selector| resolve_target(selector, None, &scene, &variables);

        assert!(resolve(TargetSelector::ThisEvent).is_inert());
        assert!(resolve(TargetSelector::Event(99)).is_inert());
        assert!(resolve(TargetSelector::Follower(-1)).is_inert());
        assert!(resolve(TargetSelector::Follower(i64::MAX)).is_inert());
        assert!(resolve(TargetSelector::FollowerByVariable(5)).is_inert());
        assert!(resolve(TargetSelector::EventByVariable(-3)).is_inert());
    }
}
