//! Common types shared across the task-data crates.

pub mod bbox;
pub mod document;
pub mod error;
pub mod geojson;
pub mod grid;
pub mod range;
pub mod time_log;
pub mod value_info;

pub use bbox::BoundingBox;
pub use document::{
    EntityId, EntityRef, GridEntity, Partfield, ProcessDataValue, Task, TaskDocument,
    TimeLogEntity, TreatmentZone,
};
pub use error::{DecodeError, DecodeResult, IngestionError, MergeWarning};
pub use geojson::{Feature, FeatureCollection, FeatureProperties, Geometry};
pub use grid::{GridCellType, GridSpec, ZoneTable};
pub use range::ValueRange;
pub use time_log::{DataLogValueSpec, HeaderField, PositionHeader, PositionStatus, TimeLogHeader};
pub use value_info::{ValueFieldInfo, ValuePresentation};
