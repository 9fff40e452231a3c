//! Decoding of raw grid cell buffers.
//!
//! A grid stores one cell per `(x, y)` in row-major order with storage row 0
//! at the south edge. Two encodings exist:
//!
//! - **Dense**: a little-endian `i32` per cell holding the value itself.
//! - **Coded**: one byte per cell holding a treatment zone code, resolved
//!   through a [`ZoneTable`].
//!
//! In both encodings the value 0 means "no data".

use taskdata_common::{
    DecodeError, DecodeResult, GridCellType, GridEntity, GridSpec, TreatmentZone, ValueRange,
    ZoneTable,
};

/// Sentinel cell value meaning "no data".
pub const NO_DATA: i32 = 0;

/// Cell payload of one grid, tagged by encoding.
#[derive(Debug, Clone)]
enum CellBuffer<'a> {
    Dense(&'a [u8]),
    Coded { codes: &'a [u8], zones: ZoneTable },
}

/// A validated, borrowable view over a grid's cells.
#[derive(Debug, Clone)]
pub struct GridCells<'a> {
    spec: &'a GridSpec,
    buffer: CellBuffer<'a>,
}

impl<'a> GridCells<'a> {
    /// Wrap a raw buffer, checking it holds every cell.
    pub fn new(
        spec: &'a GridSpec,
        cell_type: GridCellType,
        bytes: &'a [u8],
        zones: ZoneTable,
    ) -> DecodeResult<Self> {
        let expected =
            spec.buffer_len(cell_type.cell_size())
                .ok_or(DecodeError::GridTooLarge {
                    n_cols: spec.n_cols,
                    n_rows: spec.n_rows,
                })?;
        if bytes.len() < expected {
            return Err(DecodeError::BufferTooShort {
                expected,
                actual: bytes.len(),
            });
        }

        let buffer = match cell_type {
            GridCellType::Dense => CellBuffer::Dense(bytes),
            GridCellType::Coded => CellBuffer::Coded {
                codes: bytes,
                zones,
            },
        };
        Ok(Self { spec, buffer })
    }

    /// Cells of a grid entity; `zones` are the owning task's zone definitions.
    pub fn from_entity(grid: &'a GridEntity, zones: &[TreatmentZone]) -> DecodeResult<Self> {
        let table = match grid.cell_type {
            GridCellType::Coded => ZoneTable::from_zones(zones),
            GridCellType::Dense => ZoneTable::new(),
        };
        Self::new(&grid.spec, grid.cell_type, &grid.data, table)
    }

    pub fn spec(&self) -> &GridSpec {
        self.spec
    }

    pub fn cell_type(&self) -> GridCellType {
        match self.buffer {
            CellBuffer::Dense(_) => GridCellType::Dense,
            CellBuffer::Coded { .. } => GridCellType::Coded,
        }
    }

    /// Value of storage cell `(x, y)`, `None` for no-data.
    ///
    /// `(x, y)` must lie inside the grid.
    pub fn decode(&self, x: usize, y: usize) -> Option<i32> {
        debug_assert!(self.spec.contains_cell(x, y), "cell ({x}, {y}) outside grid");
        let index = y * self.spec.n_cols + x;

        let value = match &self.buffer {
            CellBuffer::Dense(bytes) => {
                let offset = index * 4;
                let raw: [u8; 4] = bytes.get(offset..offset + 4)?.try_into().ok()?;
                i32::from_le_bytes(raw)
            }
            CellBuffer::Coded { codes, zones } => zones.get(*codes.get(index)?)?,
        };

        (value != NO_DATA).then_some(value)
    }

    /// Value shown at screen pixel `(px, py)`, with screen row 0 at the north
    /// edge. `None` for no-data or a pixel outside the grid.
    pub fn value_at_screen(&self, px: usize, py: usize) -> Option<i32> {
        if !self.spec.contains_cell(px, py) {
            return None;
        }
        self.decode(px, self.spec.storage_row(py))
    }

    /// Every value that is not no-data, in storage order.
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        let n_cols = self.spec.n_cols;
        (0..self.spec.len()).filter_map(move |index| self.decode(index % n_cols, index / n_cols))
    }

    /// Full min/max over all data cells.
    pub fn value_range(&self) -> Option<ValueRange> {
        ValueRange::from_values(self.values().map(f64::from))
    }
}
