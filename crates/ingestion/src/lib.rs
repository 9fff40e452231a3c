//! Task-data ingestion.
//!
//! Turns a container file into the read-only [`TaskDocument`] tree the rest
//! of the workspace consumes. The container format is behind the
//! [`FileIngestion`] trait; [`JsonContainerIngestion`] is the format this
//! workspace reads and writes.
//!
//! # Container layout
//!
//! A JSON object with `version`, `tasks` and `partfields`. Grid cell buffers
//! and time log binaries are base64 strings.

pub mod container;
mod json;

pub use container::{ContainerDocument, CONTAINER_VERSION};
pub use json::JsonContainerIngestion;

use taskdata_common::{IngestionError, TaskDocument};

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;

/// Parses a raw container into a document.
///
/// Any structural problem fails the whole document; the error lists every
/// reason found, not just the first.
pub trait FileIngestion: Send + Sync {
    fn parse_container(&self, bytes: &[u8]) -> Result<TaskDocument>;
}
