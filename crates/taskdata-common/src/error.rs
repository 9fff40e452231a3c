//! Error types for task-data processing.
//!
//! [`IngestionError`] is document-wide and fatal. [`DecodeError`] is scoped
//! to one grid or series and never affects siblings. [`MergeWarning`] is
//! informational only.

use std::fmt;
use thiserror::Error;

/// Result type alias using DecodeError.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Malformed binary payload of a single grid or time log.
///
/// `Clone` so a failure can live in a cache slot next to successful results.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("cell buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("grid of {n_cols}x{n_rows} cells is too large to address")]
    GridTooLarge { n_cols: usize, n_rows: usize },

    #[error("unsupported grid cell type tag: {0}")]
    UnsupportedCellType(u8),

    #[error("time log record {index} truncated at byte offset {offset}")]
    TruncatedRecord { index: usize, offset: usize },

    #[error("time log record {index} references unknown data log value #{ordinal}")]
    UnknownDataLogValue { index: usize, ordinal: u8 },

    #[error("time log record {index} has an invalid timestamp")]
    InvalidTimestamp { index: usize },
}

/// The container could not be turned into a document.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("failed to ingest task data: {}", .reasons.join("; "))]
pub struct IngestionError {
    pub reasons: Vec<String>,
}

impl IngestionError {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn single(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }
}

/// A warning carried into a merged view, prefixed by the series it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeWarning {
    pub origin: String,
    pub message: String,
}

impl MergeWarning {
    pub fn new(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingestion_error_joins_reasons() {
        let err = IngestionError::new(vec!["missing tasks".into(), "bad grid".into()]);
        assert_eq!(
            err.to_string(),
            "failed to ingest task data: missing tasks; bad grid"
        );
    }

    #[test]
    fn test_merge_warning_display() {
        let warning = MergeWarning::new("TLG00001", "3 records without position skipped");
        assert_eq!(warning.to_string(), "TLG00001: 3 records without position skipped");
    }
}
