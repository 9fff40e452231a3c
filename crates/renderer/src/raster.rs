//! Rasterization of decoded grids into RGBA bitmaps.
//!
//! Screen row 0 is the north edge, so screen row `y` shows storage row
//! `n_rows - 1 - y`. [`pixel_value`] applies the same flip, which keeps a
//! value read back at a pixel equal to the value that colored it.

use grid_processor::GridCells;
use rayon::prelude::*;
use taskdata_common::{BoundingBox, ValueRange};
use tracing::debug;

use crate::error::Result;
use crate::gradient::{Color, ColorScale};
use crate::palette::Palette;
use crate::png::create_png;

/// Grids with at least this many rows are rendered in parallel by default.
pub const DEFAULT_PARALLEL_ROWS: usize = 64;

/// A georeferenced RGBA image, one pixel per grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBitmap {
    pub width: usize,
    pub height: usize,
    /// RGBA, row-major, top row first.
    pub pixels: Vec<u8>,
    pub bounds: BoundingBox,
}

impl RasterBitmap {
    pub fn pixel(&self, px: usize, py: usize) -> Option<Color> {
        if px >= self.width || py >= self.height {
            return None;
        }
        let idx = (py * self.width + px) * 4;
        let p = &self.pixels[idx..idx + 4];
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }

    /// Distinct opaque colors in the bitmap.
    pub fn opaque_colors(&self) -> Vec<Color> {
        let mut colors: Vec<Color> = self
            .pixels
            .chunks_exact(4)
            .filter(|p| p[3] != 0)
            .map(|p| Color::new(p[0], p[1], p[2], p[3]))
            .collect();
        colors.sort_by_key(|c| c.to_rgba());
        colors.dedup();
        colors
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        create_png(&self.pixels, self.width, self.height)
    }
}

/// Render every cell of `cells`: no-data cells are transparent, data cells
/// take their color from `palette` spread over `range`.
pub fn rasterize(
    cells: &GridCells<'_>,
    range: ValueRange,
    palette: &Palette,
    parallel_rows: usize,
) -> RasterBitmap {
    let spec = cells.spec();
    let (width, height) = (spec.n_cols, spec.n_rows);
    let scale = ColorScale::new(palette, range);
    let mut pixels = vec![0u8; width * height * 4];

    let render_row = |py: usize, row: &mut [u8]| {
        for (px, out) in row.chunks_exact_mut(4).enumerate() {
            let color = match cells.value_at_screen(px, py) {
                Some(value) => scale.color(f64::from(value)),
                None => Color::transparent(),
            };
            out.copy_from_slice(&color.to_rgba());
        }
    };

    let row_bytes = width * 4;
    if row_bytes > 0 {
        if height >= parallel_rows {
            pixels
                .par_chunks_mut(row_bytes)
                .enumerate()
                .for_each(|(py, row)| render_row(py, row));
        } else {
            pixels
                .chunks_mut(row_bytes)
                .enumerate()
                .for_each(|(py, row)| render_row(py, row));
        }
    }

    debug!(width, height, min = range.min(), max = range.max(), "Rasterized grid");

    RasterBitmap {
        width,
        height,
        pixels,
        bounds: spec.bounds(),
    }
}

/// Value that colored screen pixel `(px, py)`; `None` for no-data or a pixel
/// outside the grid.
pub fn pixel_value(cells: &GridCells<'_>, px: usize, py: usize) -> Option<i32> {
    cells.value_at_screen(px, py)
}
