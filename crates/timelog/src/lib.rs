//! Time log series processing.
//!
//! - [`binary`]: the per-record binary codec
//! - [`series`]: parsing a time log into valid records, field ranges and a bbox
//! - [`fill`]: interpolating per-field gaps
//! - [`merge`]: folding several series into one view
//! - [`features`]: projecting records to GeoJSON points

pub mod binary;
pub mod features;
pub mod fill;
pub mod merge;
pub mod record;
pub mod series;

pub use binary::{decode_records, to_datetime};
pub use features::{concat_tagged, project};
pub use fill::fill_missing_values;
pub use merge::{merge_series, MergedView};
pub use record::{Position, TimeLogRecord};
pub use series::{default_value_key, parse_series, BinaryTimeLogParser, ParsedSeries, SeriesParser};
