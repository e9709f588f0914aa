//! Frame to luminance-grid sampling.

use crate::camera::Frame;

/// Rec. 709 weights scaled by 10 000 so the sum is exact:
/// 2126 + 7152 + 722 = 10 000, which keeps pure white at 255.
const WEIGHT_R: u32 = 2126;
const WEIGHT_G: u32 = 7152;
const WEIGHT_B: u32 = 722;
const WEIGHT_SCALE: u32 = 10_000;

/// Luminance of one pixel: floor(0.2126 R + 0.7152 G + 0.0722 B).
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((WEIGHT_R * r as u32 + WEIGHT_G * g as u32 + WEIGHT_B * b as u32) / WEIGHT_SCALE) as u8
}

/// Row-major grid of luminance values, `width * height` long.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LuminanceGrid {
    width: u16,
    height: u16,
    values: Vec<u8>,
}

impl LuminanceGrid {
    /// Build a grid from raw values.
    ///
    /// Returns `None` unless `values.len() == width * height`.
    pub fn from_values(width: u16, height: u16, values: Vec<u8>) -> Option<Self> {
        if values.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Value at column `x`, row `y`.
    pub fn get(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterate rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on 0, and an empty grid has no rows anyway
        self.values.chunks_exact(self.width.max(1) as usize)
    }
}

/// Scale `frame` to `width x height` cells and compute each cell's luminance.
///
/// Each cell averages the RGB of the source pixels it covers, then applies
/// [`luminance`]. When the target is larger than the frame, a cell covers a
/// single nearest pixel instead. Pixels missing from a truncated frame count
/// as black, so the grid is always fully populated.
pub fn sample(frame: &Frame, width: u16, height: u16) -> LuminanceGrid {
    let mut grid = LuminanceGrid::default();
    sample_into(frame, width, height, &mut grid);
    grid
}

/// Same as [`sample`], reusing the grid's allocation.
pub fn sample_into(frame: &Frame, width: u16, height: u16, grid: &mut LuminanceGrid) {
    grid.values.clear();
    grid.width = width;
    grid.height = height;

    let cells = width as usize * height as usize;
    if cells == 0 {
        grid.width = 0;
        grid.height = 0;
        return;
    }
    if frame.width == 0 || frame.height == 0 {
        grid.values.resize(cells, 0);
        return;
    }

    grid.values.reserve(cells);

    let cell_w = frame.width as f32 / width as f32;
    let cell_h = frame.height as f32 / height as f32;

    for cy in 0..height {
        let (start_y, end_y) = cell_span(cy, cell_h, frame.height);
        for cx in 0..width {
            let (start_x, end_x) = cell_span(cx, cell_w, frame.width);

            // u64: one cell may cover an entire very large frame
            let mut sum = [0u64; 3];
            let mut count = 0u64;
            for py in start_y..end_y {
                for px in start_x..end_x {
                    // Short pixel data reads as black
                    let rgb = frame.rgb_at(px, py).unwrap_or([0, 0, 0]);
                    sum[0] += rgb[0] as u64;
                    sum[1] += rgb[1] as u64;
                    sum[2] += rgb[2] as u64;
                    count += 1;
                }
            }

            let value = if count > 0 {
                luminance(
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                )
            } else {
                0
            };
            grid.values.push(value);
        }
    }
}

/// Pixel range `[start, end)` covered by cell `index`, never empty.
fn cell_span(index: u16, cell_size: f32, limit: u32) -> (u32, u32) {
    let start = ((index as f32 * cell_size) as u32).min(limit - 1);
    let end = (((index + 1) as f32 * cell_size) as u32).clamp(start + 1, limit);
    (start, end)
}
