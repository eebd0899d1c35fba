//! Text module: control-sequence conversion and measurement of bubble text.
pub mod escape;
pub mod metrics;

pub use escape::TextContext;
pub use metrics::{measure_text, GlyphMeasure, MonospaceGlyphs, TextMetrics};
