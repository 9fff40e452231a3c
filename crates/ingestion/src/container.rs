//! Serde model of the JSON task-data container.
//!
//! Mirrors the entity tree, with binary payloads carried as base64 strings
//! and the grid cell encoding as its numeric tag.

use serde::{Deserialize, Serialize};
use taskdata_common::{TimeLogHeader, ValuePresentation};

/// Container format version this crate reads and writes.
pub const CONTAINER_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDocument {
    pub version: u32,
    #[serde(default)]
    pub tasks: Vec<ContainerTask>,
    #[serde(default)]
    pub partfields: Vec<ContainerPartfield>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerTask {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designator: Option<String>,
    /// Id of the partfield the task was carried out on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partfield: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<ContainerGrid>,
    #[serde(default)]
    pub treatment_zones: Vec<ContainerZone>,
    #[serde(default)]
    pub time_logs: Vec<ContainerTimeLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerGrid {
    pub id: String,
    pub n_cols: usize,
    pub n_rows: usize,
    pub min_east: f64,
    pub min_north: f64,
    pub cell_east: f64,
    pub cell_north: f64,
    /// 1 = coded (zone code per cell), 2 = dense (i32 per cell)
    pub cell_type: u8,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ContainerValue>,
}

/// Description of the value a grid carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerValue {
    pub ddi: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_element_id: Option<String>,
    #[serde(default)]
    pub presentation: ValuePresentation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerZone {
    pub code: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designator: Option<String>,
    #[serde(default)]
    pub values: Vec<ContainerProcessValue>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContainerProcessValue {
    pub ddi: u16,
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerTimeLog {
    pub id: String,
    pub header: TimeLogHeader,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerPartfield {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designator: Option<String>,
    /// Polygons as `[lon, lat]` rings, exterior ring first
    #[serde(default)]
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

/// Serde helper for base64 encoded byte buffers.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
