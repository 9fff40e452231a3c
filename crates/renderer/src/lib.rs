//! Rendering of task grids and time log values.
//!
//! - [`palette`]: palette definitions (built-in and JSON)
//! - [`gradient`]: continuous color scales with outlier classification
//! - [`raster`]: grid rasterization and pixel read-back
//! - [`png`]: PNG encoding of bitmaps

pub mod error;
pub mod gradient;
pub mod palette;
pub mod png;
pub mod raster;

pub use error::{RenderError, Result};
pub use gradient::{interpolate_color, Color, ColorScale, OUTLIER_COLOR};
pub use palette::{hex_to_rgb, Palette, PaletteDefinition};
pub use raster::{pixel_value, rasterize, RasterBitmap, DEFAULT_PARALLEL_ROWS};
