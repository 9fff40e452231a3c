//! Grid georeference, cell encoding tags and zone tables.

use crate::document::TreatmentZone;
use crate::error::DecodeError;
use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Dimensions and georeference of a task grid.
///
/// Storage row 0 is the southernmost row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns (east direction)
    pub n_cols: usize,
    /// Number of rows (north direction)
    pub n_rows: usize,
    /// Longitude of the south-west corner
    pub min_east: f64,
    /// Latitude of the south-west corner
    pub min_north: f64,
    /// Cell width in degrees
    pub cell_east: f64,
    /// Cell height in degrees
    pub cell_north: f64,
}

impl GridSpec {
    pub fn new(
        n_cols: usize,
        n_rows: usize,
        min_east: f64,
        min_north: f64,
        cell_east: f64,
        cell_north: f64,
    ) -> Self {
        Self {
            n_cols,
            n_rows,
            min_east,
            min_north,
            cell_east,
            cell_north,
        }
    }

    /// Geographic extent covered by all cells.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_east,
            self.min_north,
            self.min_east + self.cell_east * self.n_cols as f64,
            self.min_north + self.cell_north * self.n_rows as f64,
        )
    }

    /// Storage row shown at on-screen row `screen_row` (row 0 = top).
    pub fn storage_row(&self, screen_row: usize) -> usize {
        self.n_rows - 1 - screen_row
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.n_cols.saturating_mul(self.n_rows)
    }

    /// Bytes a buffer of `cell_size`-byte cells needs, `None` when the
    /// dimensions overflow `usize`.
    pub fn buffer_len(&self, cell_size: usize) -> Option<usize> {
        self.n_cols
            .checked_mul(self.n_rows)
            .and_then(|cells| cells.checked_mul(cell_size))
    }

    pub fn is_empty(&self) -> bool {
        self.n_cols == 0 || self.n_rows == 0
    }

    pub fn contains_cell(&self, x: usize, y: usize) -> bool {
        x < self.n_cols && y < self.n_rows
    }
}

/// Cell encoding tag of a grid entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridCellType {
    /// One byte per cell holding a treatment zone code (tag 1).
    Coded,
    /// One little-endian i32 per cell holding the value (tag 2).
    Dense,
}

impl GridCellType {
    pub fn from_tag(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(Self::Coded),
            2 => Ok(Self::Dense),
            other => Err(DecodeError::UnsupportedCellType(other)),
        }
    }

    /// Bytes per cell.
    pub fn cell_size(&self) -> usize {
        match self {
            Self::Coded => 1,
            Self::Dense => 4,
        }
    }
}

/// Lookup from an 8-bit zone code to a scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTable {
    values: [Option<i32>; 256],
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self { values: [None; 256] }
    }
}

impl ZoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from zone definitions, taking each zone's first
    /// process data value.
    pub fn from_zones(zones: &[TreatmentZone]) -> Self {
        let mut table = Self::new();
        for zone in zones {
            if let Some(pdv) = zone.values.first() {
                table.insert(zone.code, pdv.value);
            }
        }
        table
    }

    pub fn insert(&mut self, code: u8, value: i32) {
        self.values[code as usize] = Some(value);
    }

    pub fn get(&self, code: u8) -> Option<i32> {
        self.values[code as usize]
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
