//! Scene-wide resources: variables, party, viewport and the loaded map.
use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::bubble::VariableSource;
use crate::text::TextContext;

use super::data::{MapData, PartyData};

const DEFAULT_CURRENCY_UNIT: &str = "G";
const TILE_SIZE: f32 = 48.0;
const SCREEN_SIZE: Vec2 = Vec2::new(816.0, 624.0);
/// Characters are drawn slightly above their tile's bottom edge.
const CHARACTER_SHIFT_Y: f32 = 6.0;

#[derive(States, Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum SceneState {
    #[default]
    Loading,
    Map,
}

/// Numeric game variables. Unset slots read as 0.
#[derive(Resource, Debug, Clone, Default)]
pub struct GameVariables {
    values: BTreeMap<usize, i32>,
}

impl GameVariables {
    pub fn value(&self, slot: usize) -> i32 {
        self.values.get(&slot).copied().unwrap_or(0)
    }

    pub fn set(&mut self, slot: usize, value: i32) {
        self.values.insert(slot, value);
    }

    /// Writes every given slot, leaving the others untouched.
    pub fn seed(&mut self, initial: &BTreeMap<usize, i32>) {
        for (&slot, &value) in initial {
            self.set(slot, value);
        }
    }
}

impl VariableSource for GameVariables {
    fn variable(&self, slot: usize) -> i32 {
        self.value(slot)
    }
}

/// Actor names and party order used by `\N[n]` and `\P[n]`.
#[derive(Resource, Debug, Clone)]
pub struct PartyRoster {
    actors: BTreeMap<usize, String>,
    members: Vec<usize>,
    currency_unit: String,
}

impl Default for PartyRoster {
    fn default() -> Self {
        Self {
            actors: BTreeMap::new(),
            members: Vec::new(),
            currency_unit: DEFAULT_CURRENCY_UNIT.to_string(),
        }
    }
}

impl PartyRoster {
    pub fn apply(&mut self, party: &PartyData) {
        self.actors.extend(
            party
                .actors
                .iter()
                .map(|(&id, name)| (id, name.clone())),
        );
        self.members = party.members.clone();
        if let Some(unit) = &party.currency_unit {
            self.currency_unit = unit.clone();
        }
    }

    pub fn actor_name(&self, id: usize) -> Option<&str> {
        self.actors.get(&id).map(String::as_str)
    }

    /// Name of the member at 1-based `index`.
    pub fn member_name(&self, index: usize) -> Option<&str> {
        let actor = self.members.get(index.checked_sub(1)?)?;
        self.actor_name(*actor)
    }

    pub fn currency_unit(&self) -> &str {
        &self.currency_unit
    }
}

/// Borrowed view answering text substitutions from game state.
pub struct TextSources<'a> {
    variables: &'a GameVariables,
    party: &'a PartyRoster,
}

impl<'a> TextSources<'a> {
    pub fn new(variables: &'a GameVariables, party: &'a PartyRoster) -> Self {
        Self { variables, party }
    }
}

impl TextContext for TextSources<'_> {
    fn variable(&self, id: usize) -> i32 {
        self.variables.value(id)
    }

    fn actor_name(&self, id: usize) -> Option<&str> {
        self.party.actor_name(id)
    }

    fn party_member_name(&self, index: usize) -> Option<&str> {
        self.party.member_name(index)
    }

    fn currency_unit(&self) -> &str {
        self.party.currency_unit()
    }
}

/// Which part of the map is on screen, in tiles.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MapViewport {
    /// Tile coordinate shown at the top-left corner of the screen.
    pub display: Vec2,
    pub tile_size: f32,
    pub screen_size: Vec2,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            display: Vec2::ZERO,
            tile_size: TILE_SIZE,
            screen_size: SCREEN_SIZE,
        }
    }
}

impl MapViewport {
    /// Screen pixel of a character's feet, measured from the top-left corner.
    pub fn project(&self, grid: Vec2) -> Vec2 {
        let relative = grid - self.display;
        Vec2::new(
            relative.x * self.tile_size + self.tile_size / 2.0,
            (relative.y + 1.0) * self.tile_size - CHARACTER_SHIFT_Y,
        )
    }

    /// Scrolls so `grid` sits in the middle of the screen without showing
    /// anything past the map edges.
    pub fn center_on(&mut self, grid: Vec2, map_size: UVec2) {
        let visible = self.screen_size / self.tile_size;
        let max = (map_size.as_vec2() - visible).max(Vec2::ZERO);
        let centred = grid - (visible - Vec2::ONE) / 2.0;
        self.display = centred.clamp(Vec2::ZERO, max);
    }

    /// Converts a top-left screen pixel into 2D world space (origin at the
    /// centre, y up).
    pub fn to_world(&self, screen: Vec2, z: f32) -> Vec3 {
        Vec3::new(
            screen.x - self.screen_size.x / 2.0,
            self.screen_size.y / 2.0 - screen.y,
            z,
        )
    }
}

/// The map being played and any transfer waiting to happen.
#[derive(Resource, Debug, Clone)]
pub struct CurrentMap {
    pub map_id: u32,
    pub data: MapData,
    pending: Option<u32>,
}

impl Default for CurrentMap {
    fn default() -> Self {
        Self {
            map_id: 1,
            data: MapData::fallback(),
            pending: Some(1),
        }
    }
}

impl CurrentMap {
    pub fn request_transfer(&mut self, map_id: u32) {
        self.pending = Some(map_id);
    }

    pub fn take_pending(&mut self) -> Option<u32> {
        self.pending.take()
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.data.width, self.data.height)
    }

    #[cfg(test)]
    pub fn with_notes(map_id: u32, notes: &[(u32, &str)]) -> Self {
        use super::data::EventData;

        let mut data = MapData::fallback();
        data.events = notes
            .iter()
            .map(|&(id, note)| EventData {
                id,
                name: format!("Event {}", id),
                x: 0.0,
                y: 0.0,
                note: note.to_string(),
                script: Vec::new(),
            })
            .collect();
        Self {
            map_id,
            data,
            pending: None,
        }
    }
}
