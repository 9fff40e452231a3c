//! Grid cell decoding and value range statistics.
//!
//! This crate turns the raw cell buffer of a task grid into scalar values
//! and computes the numeric ranges used to color them:
//!
//! - **Decoding**: [`GridCells`] validates a buffer once and decodes single
//!   cells on demand, for dense (`i32`) and coded (zone) grids alike
//! - **Ranges**: [`ValueRangeComputer`] computes `{min, max}` with optional
//!   outlier exclusion through a pluggable [`OutlierStrategy`]
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{GridCells, ValueRangeComputer};
//!
//! let cells = GridCells::from_entity(grid, &task.treatment_zones)?;
//! let range = ValueRangeComputer::default().compute_grid(&cells, true);
//! ```

pub mod decoder;
pub mod stats;

pub use decoder::{GridCells, NO_DATA};
pub use stats::{
    quantile, IqrFences, OutlierMethod, OutlierStrategy, PercentileTrim, ValueRangeComputer,
};
