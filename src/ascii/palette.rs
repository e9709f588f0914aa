//! Glyph palettes for density rendering.

/// The 8-level receipt palette, listed brightest pixel first.
///
/// The printer renders early entries as the heaviest marks, so a bright
/// pixel lands on `@` and a black pixel on a blank.
pub const RECEIPT_PALETTE: &[char] = &['@', 'G', '*', 'P', 'O', 'o', '.', ' '];

/// Maximum number of glyphs; one per luminance value.
pub const MAX_PALETTE_LEN: usize = 256;

/// Errors from building a palette.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    #[error("palette must contain at least one glyph")]
    Empty,

    #[error("palette has {0} glyphs, at most 256 are allowed")]
    TooLong(usize),

    #[error("palette glyph {0:?} is a control character")]
    ControlChar(char),
}

/// An ordered glyph list for the density policy, brightest first.
///
/// Luminance is split into `N` equal bands of width `256 / N`; band
/// `floor(v / (256 / N))` (clamped to `N - 1`) counts up from black, and
/// the glyph is taken from the opposite end of the list so the brightest
/// band picks the first glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityPalette {
    glyphs: Vec<char>,
}

impl DensityPalette {
    pub fn new(glyphs: Vec<char>) -> Result<Self, PaletteError> {
        if glyphs.is_empty() {
            return Err(PaletteError::Empty);
        }
        if glyphs.len() > MAX_PALETTE_LEN {
            return Err(PaletteError::TooLong(glyphs.len()));
        }
        if let Some(&c) = glyphs.iter().find(|c| c.is_control()) {
            return Err(PaletteError::ControlChar(c));
        }
        Ok(Self { glyphs })
    }

    /// Parse a palette written as a plain string, e.g. `"@G*POo. "`.
    pub fn parse(s: &str) -> Result<Self, PaletteError> {
        Self::new(s.chars().collect())
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Luminance band of `value`, 0 for black up to `len() - 1`.
    #[inline]
    pub fn band(&self, value: u8) -> usize {
        let n = self.glyphs.len();
        // floor(v / (256 / n)) == floor(v * n / 256)
        ((value as usize * n) / 256).min(n - 1)
    }

    /// Glyph for one luminance value.
    #[inline]
    pub fn glyph(&self, value: u8) -> char {
        self.glyphs[self.glyphs.len() - 1 - self.band(value)]
    }
}

impl Default for DensityPalette {
    fn default() -> Self {
        Self {
            glyphs: RECEIPT_PALETTE.to_vec(),
        }
    }
}

impl std::fmt::Display for DensityPalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.glyphs.iter().try_for_each(|c| write!(f, "{}", c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_receipt_palette() {
        let palette = DensityPalette::default();
        assert_eq!(palette.glyphs(), RECEIPT_PALETTE);
        assert_eq!(palette.to_string(), "@G*POo. ");
    }

    #[test]
    fn test_band_width_is_32_for_eight_glyphs() {
        let palette = DensityPalette::default();
        assert_eq!(palette.band(0), 0);
        assert_eq!(palette.band(31), 0);
        assert_eq!(palette.band(32), 1);
        assert_eq!(palette.band(223), 6);
        assert_eq!(palette.band(224), 7);
        assert_eq!(palette.band(255), 7);
    }

    #[test]
    fn test_glyph_extremes() {
        let palette = DensityPalette::default();
        assert_eq!(palette.glyph(0), ' ');
        assert_eq!(palette.glyph(255), '@');
    }

    #[test]
    fn test_single_glyph_palette() {
        let palette = DensityPalette::parse("#").unwrap();
        assert!((0..=255u8).all(|v| palette.glyph(v) == '#'));
    }

    #[test]
    fn test_rejects_bad_palettes() {
        assert_eq!(DensityPalette::parse(""), Err(PaletteError::Empty));
        assert_eq!(
            DensityPalette::parse("ab\ncd"),
            Err(PaletteError::ControlChar('\n'))
        );
        let long: Vec<char> = std::iter::repeat('x').take(257).collect();
        assert_eq!(DensityPalette::new(long), Err(PaletteError::TooLong(257)));
    }
}
