pub mod clock;
pub mod errors;
pub mod plugin;

pub use clock::FrameClock;
pub use errors::LoadError;
pub use plugin::{CorePlugin, FrameSet};
