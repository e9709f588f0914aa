//! Camera frame to ASCII text conversion.
//!
//! 1. **Sampling** - scale a frame to the output grid and take Rec. 709
//!    luminance per cell ([`sample`])
//! 2. **Glyph mapping** - a [`GlyphPolicy`] (palette density or binary
//!    threshold) under an [`Orientation`] (straight or transposed)
//! 3. **Assembly** - newline-terminated lines ready for display or print

mod luminance;
mod mapping;
mod palette;

pub use luminance::{luminance, sample, sample_into, LuminanceGrid};
pub use mapping::{
    map_threshold, GlyphGrid, GlyphMapper, GlyphPolicy, Orientation, DARK_GLYPH,
    DEFAULT_THRESHOLD, LIGHT_GLYPH,
};
pub use palette::{DensityPalette, PaletteError, MAX_PALETTE_LEN, RECEIPT_PALETTE};
