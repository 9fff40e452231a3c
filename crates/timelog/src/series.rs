//! Parsed time log series: valid records plus derived metadata.

use std::collections::BTreeMap;

use taskdata_common::{BoundingBox, DecodeError, DecodeResult, TimeLogEntity, ValueFieldInfo, ValueRange};
use tracing::{debug, warn};

use crate::binary::decode_records;
use crate::record::TimeLogRecord;

/// Turns a time log entity into decoded records.
///
/// The seam lets callers substitute or instrument the parse routine.
pub trait SeriesParser: Send + Sync {
    fn parse_records(&self, log: &TimeLogEntity) -> DecodeResult<Vec<TimeLogRecord>>;
}

/// Parser for binary time log payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryTimeLogParser;

impl SeriesParser for BinaryTimeLogParser {
    fn parse_records(&self, log: &TimeLogEntity) -> DecodeResult<Vec<TimeLogRecord>> {
        decode_records(&log.header, &log.data)
    }
}

/// Result of parsing one series.
///
/// Only records with a valid position are kept; every statistic here is
/// computed over those records alone.
#[derive(Debug, Clone, Default)]
pub struct ParsedSeries {
    pub records: Vec<TimeLogRecord>,
    /// One entry per header value, in header order.
    pub field_infos: Vec<ValueFieldInfo>,
    pub bbox: Option<BoundingBox>,
    pub warnings: Vec<String>,
}

impl ParsedSeries {
    /// An empty result carrying the decode failure as its warning.
    pub fn failed(err: &DecodeError) -> Self {
        Self {
            warnings: vec![err.to_string()],
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.records.is_empty() && !self.warnings.is_empty()
    }

    pub fn field_info(&self, key: &str) -> Option<&ValueFieldInfo> {
        self.field_infos.iter().find(|info| info.key == key)
    }

    /// The first field with a defined range.
    pub fn default_value_key(&self) -> Option<&str> {
        default_value_key(&self.field_infos)
    }

    /// Raw values of one field over all records that log it.
    pub fn field_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.records.iter().filter_map(move |record| record.value(key))
    }
}

/// First field with a defined range.
pub fn default_value_key(infos: &[ValueFieldInfo]) -> Option<&str> {
    infos
        .iter()
        .find(|info| info.range.is_some())
        .map(|info| info.key.as_str())
}

/// Parse a series with `parser`, dropping invalid positions before any
/// statistics are taken. A decode failure yields [`ParsedSeries::failed`].
pub fn parse_series(parser: &dyn SeriesParser, log: &TimeLogEntity) -> ParsedSeries {
    let decoded = match parser.parse_records(log) {
        Ok(records) => records,
        Err(err) => {
            warn!(time_log = %log.id, error = %err, "Failed to decode time log");
            return ParsedSeries::failed(&err);
        }
    };

    let total = decoded.len();
    let records: Vec<TimeLogRecord> = decoded.into_iter().filter(TimeLogRecord::is_valid).collect();

    let mut warnings = Vec::new();
    let skipped = total - records.len();
    if skipped > 0 {
        warn!(time_log = %log.id, skipped, total, "Skipped records without a valid position");
        warnings.push(format!(
            "{} of {} records have no valid position and were skipped",
            skipped, total
        ));
    }

    let bbox = BoundingBox::from_points(records.iter().filter_map(|r| r.position.lon_lat()));

    let mut ranges: BTreeMap<&str, ValueRange> = BTreeMap::new();
    for record in &records {
        for (key, value) in &record.values {
            let range = ranges
                .entry(key.as_str())
                .or_insert_with(|| ValueRange::point(*value));
            *range = range.include(*value);
        }
    }

    let field_infos: Vec<ValueFieldInfo> = log
        .header
        .values
        .iter()
        .map(|dlv| {
            let key = dlv.value_key();
            let range = ranges.get(key.as_str()).copied();
            dlv.field_info().with_range(range)
        })
        .collect();

    debug!(
        time_log = %log.id,
        records = records.len(),
        fields = field_infos.len(),
        "Parsed time log"
    );

    ParsedSeries {
        records,
        field_infos,
        bbox,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{first_series_records, rate_header, time_log, RATE_KEY};

    #[test]
    fn test_invalid_positions_excluded() {
        let log = time_log("TLG00001", rate_header(), &first_series_records());
        let parsed = parse_series(&BinaryTimeLogParser, &log);

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.bbox.unwrap().to_array(), [0.0, 0.0, 1.0, 1.0]);

        let range = parsed.field_info(RATE_KEY).unwrap().range.unwrap();
        assert_eq!((range.min(), range.max()), (100.0, 300.0));
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.default_value_key(), Some(RATE_KEY));
    }

    #[test]
    fn test_decode_failure_is_scoped() {
        let mut log = time_log("TLG00009", rate_header(), &first_series_records());
        log.data.truncate(3);
        let parsed = parse_series(&BinaryTimeLogParser, &log);

        assert!(parsed.is_failed());
        assert!(parsed.bbox.is_none());
        assert!(parsed.field_infos.is_empty());
        assert!(parsed.warnings[0].contains("truncated"));
    }

    #[test]
    fn test_unlogged_field_has_no_range() {
        let mut header = rate_header();
        header
            .values
            .push(taskdata_common::DataLogValueSpec::new(0xE001, "DET-2"));
        let log = time_log("TLG00009", header, &first_series_records());
        let parsed = parse_series(&BinaryTimeLogParser, &log);

        let info = parsed.field_info("E001_DET-2").unwrap();
        assert!(info.range.is_none());
        assert!(info.proprietary);
    }
}
