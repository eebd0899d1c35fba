//! Bubble settings loaded from `config/bubbles.toml`.
use std::{fs, path::Path};

use bevy::prelude::*;
use serde::Deserialize;

use crate::core::LoadError;
use crate::text::MonospaceGlyphs;

const CONFIG_PATH: &str = "config/bubbles.toml";

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 10.0;

/// Advance of one glyph of the default UI font, as a fraction of its size.
const GLYPH_ADVANCE_EM: f32 = 0.6;

#[derive(Debug, Clone, Deserialize, Default)]
struct RawBubbleConfig {
    #[serde(default)]
    proximity: RawProximity,
    #[serde(default)]
    layout: RawLayout,
    #[serde(default)]
    timing: RawTiming,
    #[serde(default)]
    font: RawFont,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawProximity {
    distance: f32,
}

impl Default for RawProximity {
    fn default() -> Self {
        Self { distance: 2.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawLayout {
    padding: u32,
    margin: f32,
}

impl Default for RawLayout {
    fn default() -> Self {
        Self {
            padding: 12,
            margin: 8.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawTiming {
    ms_per_character: u64,
}

impl Default for RawTiming {
    fn default() -> Self {
        Self {
            ms_per_character: 150,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawFont {
    /// Derived from `size` when absent.
    glyph_width: Option<u32>,
    line_height: u32,
    size: f32,
}

impl Default for RawFont {
    fn default() -> Self {
        Self {
            glyph_width: None,
            line_height: 36,
            size: 22.0,
        }
    }
}

/// Runtime bubble configuration derived from `config/bubbles.toml`.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct BubbleSettings {
    /// Proximity radius for notetag bubbles, in tiles.
    pub distance: f32,
    /// Pixels between text and bubble edge on every side.
    pub padding: u32,
    /// Pixels between the target's sprite top and the bubble's bottom edge.
    pub margin: f32,
    /// Display time per visible character when a show command passes 0.
    pub ms_per_character: u64,
    /// Measured advance per glyph; matches the rendered font at `font_size`.
    pub glyph_width: u32,
    /// Measured and rendered distance between lines.
    pub line_height: u32,
    pub font_size: f32,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        RawBubbleConfig::default().into()
    }
}

impl BubbleSettings {
    pub fn load_or_default() -> Self {
        match Self::load(Path::new(CONFIG_PATH)) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("{}. Falling back to default bubble settings.", err);
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|err| LoadError::io(path, err))?;
        let parsed =
            toml::from_str::<RawBubbleConfig>(&raw).map_err(|err| LoadError::toml(path, err))?;
        Ok(parsed.into())
    }

    pub fn glyphs(&self) -> MonospaceGlyphs {
        MonospaceGlyphs {
            glyph_width: self.glyph_width,
            line_height: self.line_height,
        }
    }

    /// Display time for a command bubble shown with a duration of 0.
    pub fn auto_duration_ms(&self, visible_length: usize) -> u64 {
        u64::try_from(visible_length)
            .unwrap_or(u64::MAX)
            .saturating_mul(self.ms_per_character)
    }
}

impl From<RawBubbleConfig> for BubbleSettings {
    fn from(value: RawBubbleConfig) -> Self {
        let distance = if value.proximity.distance.is_finite() {
            value.proximity.distance.clamp(MIN_DISTANCE, MAX_DISTANCE)
        } else {
            RawProximity::default().distance
        };

        let font_size = if value.font.size.is_finite() {
            value.font.size.max(1.0)
        } else {
            RawFont::default().size
        };
        let glyph_width = value
            .font
            .glyph_width
            .unwrap_or_else(|| (font_size * GLYPH_ADVANCE_EM).ceil() as u32);

        Self {
            distance,
            padding: value.layout.padding,
            margin: value.layout.margin.max(0.0),
            ms_per_character: value.timing.ms_per_character,
            glyph_width: glyph_width.max(1),
            line_height: value.font.line_height.max(1),
            font_size,
        }
    }
}
