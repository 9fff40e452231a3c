//! Document-scoped cache of derived task-data artifacts.
//!
//! A [`Session`] holds the active [`taskdata_common::TaskDocument`] and a
//! [`DerivedDataCache`] over it. Every artifact (parsed series, merged views,
//! GeoJSON, value ranges, grid summaries, area geometry) is computed on first
//! request and reused until the document is replaced or invalidated.

pub mod area;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod slot_cache;

pub use area::{AreaGeometry, AreaProjector, PolygonAreaProjector};
pub use cache::{CacheStats, DerivedDataCache, GridInfo, MergeSpec, SeriesRef};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use session::{DocumentState, Session};
pub use slot_cache::{SlotCache, SlotCacheStats};
