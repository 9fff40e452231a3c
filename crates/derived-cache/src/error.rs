//! Error types for cache queries.

use taskdata_common::{DecodeError, IngestionError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("no task-data document is loaded")]
    NoActiveDocument,

    #[error("{kind} {id:?} not found in the active document")]
    NotFound { kind: &'static str, id: String },

    #[error("grid {id:?} could not be decoded: {source}")]
    Decode {
        id: String,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error("invalid cache configuration: {0}")]
    Config(String),
}

impl CacheError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
