pub mod board;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod layer;
pub mod plugin;
pub mod systems;
pub mod target;
pub mod timers;
pub mod types;
pub mod wait;

#[cfg(test)]
mod test_support;

pub use board::BubbleBoard;
pub use commands::{ShowBubbleArgs, ShowBubbleMessage};
pub use plugin::BubblePlugin;
pub use target::{EntityLookup, EntityPose, TargetSelector, VariableSource};
pub use wait::BubbleWait;
