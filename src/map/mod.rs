//! Host scene: map data, characters, viewport and game state the bubbles read.

pub mod components;
pub mod data;
pub mod plugin;
pub mod resources;
pub mod snapshot;
pub mod systems;

pub use data::{note_value, MapData};
pub use plugin::MapPlugin;
pub use resources::{CurrentMap, GameVariables, MapViewport, PartyRoster, SceneState, TextSources};
pub use snapshot::SceneSnapshot;
