//! Filling of per-field gaps in a record list.
//!
//! A record that does not log a field gets a value derived from the nearest
//! records that do: linear interpolation by timestamp between the previous
//! and next sample, or a copy of the only neighbour at the start or end of
//! the series. Fields no record logs stay absent.

use std::collections::BTreeSet;

use crate::record::TimeLogRecord;

/// Return a copy of `records` with every field gap filled.
pub fn fill_missing_values(records: &[TimeLogRecord]) -> Vec<TimeLogRecord> {
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.values.keys().map(String::as_str))
        .collect();

    let mut filled = records.to_vec();
    for key in keys {
        fill_field(records, &mut filled, key);
    }
    filled
}

fn fill_field(source: &[TimeLogRecord], target: &mut [TimeLogRecord], key: &str) {
    let samples: Vec<usize> = source
        .iter()
        .enumerate()
        .filter(|(_, record)| record.values.contains_key(key))
        .map(|(index, _)| index)
        .collect();

    let (Some(&first), Some(&last)) = (samples.first(), samples.last()) else {
        return;
    };

    // `next` indexes into `samples`: the first sample at or after `index`.
    let mut next = 0;
    for index in 0..source.len() {
        if samples.get(next) == Some(&index) {
            next += 1;
            continue;
        }

        let value = if index < first {
            source[first].values[key]
        } else if index > last {
            source[last].values[key]
        } else {
            interpolate(&source[samples[next - 1]], &source[samples[next]], &source[index], key)
        };
        target[index].values.insert(key.to_string(), value);
    }
}

/// Linear interpolation of `key` at `at`'s timestamp between `before` and
/// `after`. Equal timestamps take the earlier sample.
fn interpolate(
    before: &TimeLogRecord,
    after: &TimeLogRecord,
    at: &TimeLogRecord,
    key: &str,
) -> f64 {
    let v0 = before.values[key];
    let v1 = after.values[key];
    let span = (after.time - before.time).num_milliseconds();
    if span <= 0 {
        return v0;
    }
    let offset = (at.time - before.time).num_milliseconds().clamp(0, span);
    v0 + (v1 - v0) * offset as f64 / span as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Position;
    use chrono::{Duration, TimeZone, Utc};

    fn record(secs: i64, value: Option<f64>) -> TimeLogRecord {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut values = std::collections::BTreeMap::new();
        if let Some(v) = value {
            values.insert("k".to_string(), v);
        }
        TimeLogRecord {
            time: base + Duration::seconds(secs),
            position: Position::default(),
            values,
        }
    }

    fn values(records: &[TimeLogRecord]) -> Vec<Option<f64>> {
        records.iter().map(|r| r.value("k")).collect()
    }

    #[test]
    fn test_interior_gap_interpolates_by_time() {
        let records = vec![
            record(0, Some(10.0)),
            record(1, None),
            record(4, None),
            record(5, Some(20.0)),
        ];
        let filled = fill_missing_values(&records);
        assert_eq!(
            values(&filled),
            vec![Some(10.0), Some(12.0), Some(18.0), Some(20.0)]
        );
        // source untouched
        assert_eq!(records[1].value("k"), None);
    }

    #[test]
    fn test_edges_copy_nearest_sample() {
        let records = vec![
            record(0, None),
            record(1, Some(5.0)),
            record(2, Some(7.0)),
            record(3, None),
        ];
        let filled = fill_missing_values(&records);
        assert_eq!(
            values(&filled),
            vec![Some(5.0), Some(5.0), Some(7.0), Some(7.0)]
        );
    }

    #[test]
    fn test_field_never_logged_stays_absent() {
        let records = vec![record(0, None), record(1, None)];
        let filled = fill_missing_values(&records);
        assert_eq!(values(&filled), vec![None, None]);
    }

    #[test]
    fn test_equal_timestamps() {
        let records = vec![record(0, Some(1.0)), record(0, None), record(0, Some(3.0))];
        let filled = fill_missing_values(&records);
        assert_eq!(filled[1].value("k"), Some(1.0));
    }
}
