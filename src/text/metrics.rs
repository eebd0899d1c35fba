//! Pixel footprint and visible character count of bubble text.
use super::escape::{convert, TextContext};

/// Glyph measurement provided by the text-layout collaborator.
pub trait GlyphMeasure {
    /// Width in pixels of one already-converted line.
    fn line_width(&self, line: &str) -> u32;

    fn line_height(&self) -> u32;
}

/// Fixed-advance measurement used when no real font metrics are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceGlyphs {
    pub glyph_width: u32,
    pub line_height: u32,
}

impl GlyphMeasure for MonospaceGlyphs {
    fn line_width(&self, line: &str) -> u32 {
        let glyphs = u32::try_from(line.chars().count()).unwrap_or(u32::MAX);
        glyphs.saturating_mul(self.glyph_width)
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }
}

/// Measured text: unpadded size, drawn character count and drawable lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMetrics {
    pub width: u32,
    pub height: u32,
    pub visible_length: usize,
    pub lines: Vec<String>,
}

/// Converts `text` and measures what will actually be drawn. Directives add
/// neither characters nor width; only substituted output does.
pub fn measure_text(
    text: &str,
    context: &dyn TextContext,
    glyphs: &dyn GlyphMeasure,
) -> TextMetrics {
    let converted = convert(text, context);
    let width = converted
        .lines
        .iter()
        .map(|line| glyphs.line_width(line))
        .max()
        .unwrap_or(0);
    let line_count = u32::try_from(converted.lines.len().max(1)).unwrap_or(u32::MAX);

    TextMetrics {
        width,
        height: line_count.saturating_mul(glyphs.line_height()),
        visible_length: converted.visible_length(),
        lines: converted.lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blank;

    impl TextContext for Blank {
        fn variable(&self, _id: usize) -> i32 {
            7
        }

        fn actor_name(&self, _id: usize) -> Option<&str> {
            None
        }

        fn party_member_name(&self, _index: usize) -> Option<&str> {
            None
        }

        fn currency_unit(&self) -> &str {
            "Gold"
        }
    }

    const GLYPHS: MonospaceGlyphs = MonospaceGlyphs {
        glyph_width: 10,
        line_height: 30,
    };

    #[test]
    fn widest_line_sets_width_and_lines_set_height() {
        let metrics = measure_text("abc\nabcdef", &Blank, &GLYPHS);
        assert_eq!(metrics.width, 60);
        assert_eq!(metrics.height, 60);
        assert_eq!(metrics.visible_length, 9);
    }

    #[test]
    fn directives_contribute_no_width() {
        let plain = measure_text("Halt", &Blank, &GLYPHS);
        let colored = measure_text(r"\C[2]Halt\C[0]\I[5]", &Blank, &GLYPHS);
        assert_eq!(plain.width, colored.width);
        assert_eq!(colored.visible_length, 4);
    }

    #[test]
    fn substituted_output_is_measured() {
        let metrics = measure_text(r"\V[1]\G", &Blank, &GLYPHS);
        assert_eq!(metrics.lines, vec!["7Gold"]);
        assert_eq!(metrics.width, 50);
    }

    #[test]
    fn empty_text_still_occupies_one_line() {
        let metrics = measure_text("", &Blank, &GLYPHS);
        assert_eq!(metrics.width, 0);
        assert_eq!(metrics.height, 30);
        assert_eq!(metrics.visible_length, 0);
    }
}
