//! Luminance to glyph mapping and text assembly.

use super::luminance::LuminanceGrid;
use super::palette::DensityPalette;

/// Glyph the threshold policy uses for pixels above the cutoff.
pub const LIGHT_GLYPH: char = ' ';
/// Glyph the threshold policy uses for pixels at or below the cutoff.
pub const DARK_GLYPH: char = '*';
/// Cutoff used when none is configured.
pub const DEFAULT_THRESHOLD: u8 = 128;

/// How luminance values become glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphPolicy {
    /// Multi-level palette lookup
    Density(DensityPalette),
    /// Two-level cut: `v > t` is light, `v <= t` is dark
    Threshold(u8),
}

impl GlyphPolicy {
    #[inline]
    pub fn glyph(&self, value: u8) -> char {
        match self {
            GlyphPolicy::Density(palette) => palette.glyph(value),
            GlyphPolicy::Threshold(t) => map_threshold(value, *t),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GlyphPolicy::Density(_) => "density",
            GlyphPolicy::Threshold(_) => "threshold",
        }
    }
}

impl Default for GlyphPolicy {
    fn default() -> Self {
        GlyphPolicy::Density(DensityPalette::default())
    }
}

/// Two-level mapping, inclusive on the dark side.
#[inline]
pub fn map_threshold(value: u8, threshold: u8) -> char {
    if value > threshold {
        LIGHT_GLYPH
    } else {
        DARK_GLYPH
    }
}

/// Iteration order of the emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// One line per sampled row
    #[default]
    Straight,
    /// One line per sampled column, for narrow receipt paper
    Transposed,
}

impl Orientation {
    pub fn name(&self) -> &'static str {
        match self {
            Orientation::Straight => "straight",
            Orientation::Transposed => "transposed",
        }
    }
}

/// Row-major grid of glyphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphGrid {
    width: u16,
    height: u16,
    chars: Vec<char>,
}

impl GlyphGrid {
    /// Characters per line.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of lines.
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn lines(&self) -> impl Iterator<Item = &[char]> {
        self.chars.chunks_exact(self.width.max(1) as usize)
    }

    /// Lines joined with `\n`, each line newline-terminated.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        self.write_text(&mut text);
        text
    }

    fn write_text(&self, out: &mut String) {
        out.clear();
        out.reserve((self.width as usize + 1) * self.height as usize);
        for line in self.lines() {
            out.extend(line.iter());
            out.push('\n');
        }
    }
}

/// A glyph policy plus an orientation, fixed when rendering starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphMapper {
    pub policy: GlyphPolicy,
    pub orientation: Orientation,
    /// Flip luminance (`255 - v`) before mapping
    pub invert: bool,
}

impl GlyphMapper {
    pub fn new(policy: GlyphPolicy, orientation: Orientation) -> Self {
        Self {
            policy,
            orientation,
            invert: false,
        }
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    #[inline]
    fn glyph(&self, value: u8) -> char {
        let value = if self.invert { 255 - value } else { value };
        self.policy.glyph(value)
    }

    /// Map every cell of `grid`.
    ///
    /// Transposed output has `grid.height()` glyphs per line and
    /// `grid.width()` lines; line `x` is column `x` read top to bottom.
    pub fn map(&self, grid: &LuminanceGrid) -> GlyphGrid {
        let mut out = GlyphGrid::default();
        self.map_into(grid, &mut out);
        out
    }

    /// Same as [`GlyphMapper::map`], reusing the output allocation.
    pub fn map_into(&self, grid: &LuminanceGrid, out: &mut GlyphGrid) {
        out.chars.clear();
        out.chars.reserve(grid.values().len());

        match self.orientation {
            Orientation::Straight => {
                out.width = grid.width();
                out.height = grid.height();
                out.chars
                    .extend(grid.values().iter().map(|&v| self.glyph(v)));
            }
            Orientation::Transposed => {
                out.width = grid.height();
                out.height = grid.width();
                let w = grid.width() as usize;
                for x in 0..w {
                    out.chars.extend(
                        grid.values()
                            .iter()
                            .skip(x)
                            .step_by(w)
                            .map(|&v| self.glyph(v)),
                    );
                }
            }
        }
    }

    /// Map `grid` straight into display text.
    pub fn render_into(&self, grid: &LuminanceGrid, scratch: &mut GlyphGrid, text: &mut String) {
        self.map_into(grid, scratch);
        scratch.write_text(text);
    }
}
