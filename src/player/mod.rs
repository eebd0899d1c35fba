//! Player module - movement, event detection and script triggering.

pub mod components;
pub mod plugin;
pub mod systems;

pub use plugin::PlayerPlugin;
