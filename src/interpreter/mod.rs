//! Minimal map-event interpreter: runs show-bubble, wait and script commands.

pub mod plugin;
pub mod script;
pub mod systems;

pub use plugin::InterpreterPlugin;
pub use script::{EventCommand, MapInterpreter, WaitMode};
