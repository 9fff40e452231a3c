//! Binary time log record codec.
//!
//! Record layout (little-endian):
//!
//! ```text
//! u32  milliseconds since midnight
//! u16  days since 1980-01-01
//! ...  position fields marked as logged in the header, in header order:
//!      north i32, east i32, up i32, status u8, pdop u16, hdop u16,
//!      satellites u8, gps time u32, gps date u16
//! u8   number of data log values N
//! N x  (u8 ordinal, i32 value)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use taskdata_common::{
    DecodeError, DecodeResult, HeaderField, PositionStatus, TimeLogHeader,
};

use crate::record::{Position, TimeLogRecord};

/// Latitude and longitude integers per degree.
const UNITS_PER_DEGREE: f64 = 1e7;

/// Epoch of on-wire dates.
fn epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1980, 1, 1)
}

/// Combine an on-wire date and time of day.
pub fn to_datetime(days: u16, millis: u32) -> Option<DateTime<Utc>> {
    let date = epoch()?.checked_add_days(Days::new(u64::from(days)))?;
    let secs = millis / 1000;
    let nanos = (millis % 1000) * 1_000_000;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?;
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Little-endian reader over one time log payload.
struct RecordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    record: usize,
}

impl<'a> RecordReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            record: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn take<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let end = self.offset + N;
        let chunk = self
            .bytes
            .get(self.offset..end)
            .ok_or(DecodeError::TruncatedRecord {
                index: self.record,
                offset: self.offset,
            })?;
        self.offset = end;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Resolve a header field: read it when logged, else use the fixed value.
    fn field<T: Copy>(
        &mut self,
        field: &HeaderField<T>,
        read: fn(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<Option<T>> {
        match field {
            HeaderField::Absent => Ok(None),
            HeaderField::Fixed(value) => Ok(Some(*value)),
            HeaderField::Logged => read(self).map(Some),
        }
    }
}

/// Decode every record of a time log payload.
///
/// Any malformed record fails the whole payload.
pub fn decode_records(header: &TimeLogHeader, bytes: &[u8]) -> DecodeResult<Vec<TimeLogRecord>> {
    let keys: Vec<String> = header.values.iter().map(|dlv| dlv.value_key()).collect();
    let pos = &header.position;
    let mut reader = RecordReader::new(bytes);
    let mut records = Vec::new();

    while !reader.is_empty() {
        let index = reader.record;
        let millis = reader.u32()?;
        let days = reader.u16()?;
        let time = to_datetime(days, millis).ok_or(DecodeError::InvalidTimestamp { index })?;

        let north = reader.field(&pos.north, RecordReader::i32)?;
        let east = reader.field(&pos.east, RecordReader::i32)?;
        let up = reader.field(&pos.up, RecordReader::i32)?;
        let status = reader.field(&pos.status, RecordReader::u8)?;
        let pdop = reader.field(&pos.pdop, RecordReader::u16)?;
        let hdop = reader.field(&pos.hdop, RecordReader::u16)?;
        let satellites = reader.field(&pos.satellites, RecordReader::u8)?;
        let gps_time = reader.field(&pos.gps_time, RecordReader::u32)?;
        let gps_date = reader.field(&pos.gps_date, RecordReader::u16)?;

        let position = Position {
            lat: north.map(|v| f64::from(v) / UNITS_PER_DEGREE),
            lon: east.map(|v| f64::from(v) / UNITS_PER_DEGREE),
            altitude: up.map(|v| f64::from(v) / 1000.0),
            status: status.map(PositionStatus::from_code),
            pdop: pdop.map(|v| f64::from(v) / 10.0),
            hdop: hdop.map(|v| f64::from(v) / 10.0),
            satellites,
            gps_time: match (gps_date, gps_time) {
                (Some(days), Some(millis)) => to_datetime(days, millis),
                _ => None,
            },
        };

        let count = reader.u8()?;
        let mut values = BTreeMap::new();
        for _ in 0..count {
            let ordinal = reader.u8()?;
            let value = reader.i32()?;
            let key = keys
                .get(usize::from(ordinal))
                .ok_or(DecodeError::UnknownDataLogValue { index, ordinal })?;
            values.insert(key.clone(), f64::from(value));
        }

        records.push(TimeLogRecord {
            time,
            position,
            values,
        });
        reader.record += 1;
    }

    Ok(records)
}
