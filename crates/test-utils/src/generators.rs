//! Generators for grid cell buffers and time log binaries.
//!
//! These produce predictable byte payloads in the same layouts the decoders
//! read, so tests can assert exact values after decoding.

use taskdata_common::{HeaderField, TimeLogHeader};

/// Days from 1980-01-01 to 2024-01-01.
pub const DATE_2024_01_01: u16 = 16071;

/// Encodes dense cell values as little-endian i32, row-major, southernmost
/// row first.
pub fn dense_grid_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Creates dense cell values with predictable contents.
///
/// Each cell value is `col * 100 + row + 1`, so no cell is no-data and a
/// decoded value identifies its cell.
///
/// # Example
///
/// ```
/// use test_utils::create_test_cells;
///
/// let cells = create_test_cells(3, 2);
/// assert_eq!(cells.len(), 6);
/// assert_eq!(cells[0], 1);   // col=0, row=0
/// assert_eq!(cells[1], 101); // col=1, row=0
/// assert_eq!(cells[3], 2);   // col=0, row=1
/// ```
pub fn create_test_cells(n_cols: usize, n_rows: usize) -> Vec<i32> {
    let mut cells = Vec::with_capacity(n_cols * n_rows);
    for row in 0..n_rows {
        for col in 0..n_cols {
            cells.push((col * 100 + row + 1) as i32);
        }
    }
    cells
}

/// Like [`create_test_cells`] but every `every`-th cell is no-data (0).
pub fn create_sparse_cells(n_cols: usize, n_rows: usize, every: usize) -> Vec<i32> {
    let mut cells = create_test_cells(n_cols, n_rows);
    for (idx, cell) in cells.iter_mut().enumerate() {
        if every > 0 && idx % every == 0 {
            *cell = 0;
        }
    }
    cells
}

/// Creates cells holding `value` everywhere except a no-data border.
pub fn create_constant_cells(n_cols: usize, n_rows: usize, value: i32) -> Vec<i32> {
    let mut cells = Vec::with_capacity(n_cols * n_rows);
    for row in 0..n_rows {
        for col in 0..n_cols {
            let border = row == 0 || col == 0 || row + 1 == n_rows || col + 1 == n_cols;
            cells.push(if border { 0 } else { value });
        }
    }
    cells
}

/// One time log record to encode.
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub time_ms: u32,
    pub date: u16,
    pub north: i32,
    pub east: i32,
    pub up: i32,
    pub status: u8,
    pub pdop: u16,
    pub hdop: u16,
    pub satellites: u8,
    pub gps_time: u32,
    pub gps_date: u16,
    pub values: Vec<(u8, i32)>,
}

impl TestRecord {
    /// A GNSS-fixed record on 2024-01-01 at `time_ms` after midnight.
    pub fn at(time_ms: u32, lat: f64, lon: f64) -> Self {
        Self {
            time_ms,
            date: DATE_2024_01_01,
            north: (lat * 1e7).round() as i32,
            east: (lon * 1e7).round() as i32,
            up: 0,
            status: 1,
            pdop: 10,
            hdop: 8,
            satellites: 12,
            gps_time: time_ms,
            gps_date: DATE_2024_01_01,
            values: Vec::new(),
        }
    }

    /// Log `value` for the data log value at `ordinal`.
    pub fn with_value(mut self, ordinal: u8, value: i32) -> Self {
        self.values.push((ordinal, value));
        self
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }
}

/// Encodes records in the binary layout described by `header`.
pub fn encode_time_log(header: &TimeLogHeader, records: &[TestRecord]) -> Vec<u8> {
    let pos = &header.position;
    let mut out = Vec::new();
    for record in records {
        out.extend_from_slice(&record.time_ms.to_le_bytes());
        out.extend_from_slice(&record.date.to_le_bytes());
        if pos.north.is_logged() {
            out.extend_from_slice(&record.north.to_le_bytes());
        }
        if pos.east.is_logged() {
            out.extend_from_slice(&record.east.to_le_bytes());
        }
        if pos.up.is_logged() {
            out.extend_from_slice(&record.up.to_le_bytes());
        }
        if pos.status.is_logged() {
            out.push(record.status);
        }
        if pos.pdop.is_logged() {
            out.extend_from_slice(&record.pdop.to_le_bytes());
        }
        if pos.hdop.is_logged() {
            out.extend_from_slice(&record.hdop.to_le_bytes());
        }
        if pos.satellites.is_logged() {
            out.push(record.satellites);
        }
        if pos.gps_time.is_logged() {
            out.extend_from_slice(&record.gps_time.to_le_bytes());
        }
        if pos.gps_date.is_logged() {
            out.extend_from_slice(&record.gps_date.to_le_bytes());
        }
        out.push(record.values.len() as u8);
        for (ordinal, value) in &record.values {
            out.push(*ordinal);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

/// A header logging north, east and status per record.
pub fn header_with_status(values: Vec<taskdata_common::DataLogValueSpec>) -> TimeLogHeader {
    let mut header = TimeLogHeader::new(values);
    header.position.status = HeaderField::Logged;
    header
}
