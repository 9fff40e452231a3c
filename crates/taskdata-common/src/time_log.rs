//! Time log header model.
//!
//! The header tells the binary codec which position fields are written per
//! record and which data log values a record may reference by ordinal.

use serde::{Deserialize, Serialize};

use crate::value_info::{ValueFieldInfo, ValuePresentation};

/// How a header field is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField<T> {
    /// Not recorded at all.
    Absent,
    /// Same value for every record, stored in the header.
    Fixed(T),
    /// Written into every binary record.
    Logged,
}

impl<T> Default for HeaderField<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T: Copy> HeaderField<T> {
    pub fn is_logged(&self) -> bool {
        matches!(self, Self::Logged)
    }

    /// The header-level value, if the field is fixed.
    pub fn fixed(&self) -> Option<T> {
        match self {
            Self::Fixed(value) => Some(*value),
            _ => None,
        }
    }
}

/// Position fields of a time log header, in binary order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHeader {
    /// Latitude, 1e-7 degrees
    #[serde(default)]
    pub north: HeaderField<i32>,
    /// Longitude, 1e-7 degrees
    #[serde(default)]
    pub east: HeaderField<i32>,
    /// Altitude, millimetres
    #[serde(default)]
    pub up: HeaderField<i32>,
    #[serde(default)]
    pub status: HeaderField<u8>,
    /// Position dilution of precision, 0.1 units
    #[serde(default)]
    pub pdop: HeaderField<u16>,
    /// Horizontal dilution of precision, 0.1 units
    #[serde(default)]
    pub hdop: HeaderField<u16>,
    #[serde(default)]
    pub satellites: HeaderField<u8>,
    /// GPS time of day, milliseconds
    #[serde(default)]
    pub gps_time: HeaderField<u32>,
    /// GPS date, days since 1980-01-01
    #[serde(default)]
    pub gps_date: HeaderField<u16>,
}

impl Default for PositionHeader {
    fn default() -> Self {
        Self {
            north: HeaderField::Logged,
            east: HeaderField::Logged,
            up: HeaderField::Absent,
            status: HeaderField::Absent,
            pdop: HeaderField::Absent,
            hdop: HeaderField::Absent,
            satellites: HeaderField::Absent,
            gps_time: HeaderField::Absent,
            gps_date: HeaderField::Absent,
        }
    }
}

/// GNSS fix quality reported with a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    NoGpsFix,
    GnssFix,
    DgnssFix,
    PreciseGnss,
    RtkFixedInteger,
    RtkFloat,
    EstimatedDeadReckoning,
    ManualInput,
    SimulateMode,
    Reserved(u8),
    Error,
    NotAvailable,
}

impl PositionStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::NoGpsFix,
            1 => Self::GnssFix,
            2 => Self::DgnssFix,
            3 => Self::PreciseGnss,
            4 => Self::RtkFixedInteger,
            5 => Self::RtkFloat,
            6 => Self::EstimatedDeadReckoning,
            7 => Self::ManualInput,
            8 => Self::SimulateMode,
            14 => Self::Error,
            15 => Self::NotAvailable,
            other => Self::Reserved(other),
        }
    }

    /// Whether a position carrying this status can be placed on a map.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::NoGpsFix | Self::Error | Self::NotAvailable)
    }
}

/// One data log value a record may reference by its ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLogValueSpec {
    pub ddi: u16,
    pub device_element_id: String,
    #[serde(default)]
    pub device_element_designator: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub presentation: ValuePresentation,
}

impl DataLogValueSpec {
    pub fn new(ddi: u16, device_element_id: impl Into<String>) -> Self {
        Self {
            ddi,
            device_element_id: device_element_id.into(),
            device_element_designator: None,
            name: None,
            presentation: ValuePresentation::default(),
        }
    }

    pub fn value_key(&self) -> String {
        ValueFieldInfo::value_key(self.ddi, Some(&self.device_element_id))
    }

    /// Field info without an observed range.
    pub fn field_info(&self) -> ValueFieldInfo {
        let mut info = ValueFieldInfo::new(self.ddi, Some(&self.device_element_id))
            .with_presentation(&self.presentation);
        info.device_element_designator = self.device_element_designator.clone();
        info.name = self.name.clone();
        info
    }
}

/// Binary layout description of one time log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeLogHeader {
    #[serde(default)]
    pub position: PositionHeader,
    #[serde(default)]
    pub values: Vec<DataLogValueSpec>,
}

impl TimeLogHeader {
    pub fn new(values: Vec<DataLogValueSpec>) -> Self {
        Self {
            position: PositionHeader::default(),
            values,
        }
    }
}
