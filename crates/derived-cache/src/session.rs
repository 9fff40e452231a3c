//! The active-document session.
//!
//! Exactly one document's [`DerivedDataCache`] is live at a time. Loading a
//! document swaps in a fresh cache in one step; a caller still holding the
//! previous cache can check [`Session::is_live`] and must treat a stale cache
//! as dead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use ingestion::FileIngestion;
use renderer::{Palette, RasterBitmap};
use taskdata_common::{
    BoundingBox, FeatureCollection, IngestionError, TaskDocument, ValueFieldInfo, ValueRange,
};
use timelog::{BinaryTimeLogParser, SeriesParser};
use tracing::{info, warn};

use crate::area::{AreaGeometry, AreaProjector, PolygonAreaProjector};
use crate::cache::{DerivedDataCache, GridInfo, SeriesRef};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// What the session currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    NotLoaded,
    Loaded { generation: u64 },
    Failed(IngestionError),
}

enum Active {
    None,
    Loaded(Arc<DerivedDataCache>),
    Failed(IngestionError),
}

pub struct Session {
    config: CacheConfig,
    parser: Arc<dyn SeriesParser>,
    area_projector: Arc<dyn AreaProjector>,
    active: RwLock<Active>,
    next_generation: AtomicU64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("next_generation", &self.next_generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl Session {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            parser: Arc::new(BinaryTimeLogParser),
            area_projector: Arc::new(PolygonAreaProjector),
            active: RwLock::new(Active::None),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Validate `config` before building a session from it.
    pub fn try_new(config: CacheConfig) -> Result<Self> {
        config.validate().map_err(CacheError::Config)?;
        Ok(Self::new(config))
    }

    /// Use `parser` for every series parsed by caches created from now on.
    pub fn with_parser(mut self, parser: Arc<dyn SeriesParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_area_projector(mut self, projector: Arc<dyn AreaProjector>) -> Self {
        self.area_projector = projector;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Make `document` the active one, replacing any previous cache.
    pub fn set_active(&self, document: TaskDocument) -> Arc<DerivedDataCache> {
        self.activate(Arc::new(document))
    }

    /// Ingest a container and activate the result. On failure the session
    /// enters the failed state and the previous cache is dropped.
    pub fn load_container(
        &self,
        ingestion: &dyn FileIngestion,
        bytes: &[u8],
    ) -> std::result::Result<Arc<DerivedDataCache>, IngestionError> {
        match ingestion.parse_container(bytes) {
            Ok(document) => Ok(self.set_active(document)),
            Err(err) => {
                warn!(error = %err, "Failed to ingest task data");
                *self.active.write().unwrap_or_else(PoisonError::into_inner) =
                    Active::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Throw away every derived artifact of the active document; the next
    /// request recomputes from scratch.
    pub fn invalidate_all(&self) {
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let document = match &*slot {
            Active::Loaded(cache) => cache.document_arc(),
            _ => return,
        };
        info!("Invalidating all derived data");
        self.install(&mut slot, document);
    }

    /// Drop the active document.
    pub fn clear(&self) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Active::None;
        info!("Cleared active document");
    }

    pub fn state(&self) -> DocumentState {
        match &*self.active.read().unwrap_or_else(PoisonError::into_inner) {
            Active::None => DocumentState::NotLoaded,
            Active::Loaded(cache) => DocumentState::Loaded {
                generation: cache.generation(),
            },
            Active::Failed(err) => DocumentState::Failed(err.clone()),
        }
    }

    /// The live cache.
    pub fn active(&self) -> Result<Arc<DerivedDataCache>> {
        match &*self.active.read().unwrap_or_else(PoisonError::into_inner) {
            Active::Loaded(cache) => Ok(Arc::clone(cache)),
            Active::Failed(err) => Err(CacheError::Ingestion(err.clone())),
            Active::None => Err(CacheError::NoActiveDocument),
        }
    }

    /// Whether `cache` is still the live one.
    pub fn is_live(&self, cache: &DerivedDataCache) -> bool {
        matches!(
            &*self.active.read().unwrap_or_else(PoisonError::into_inner),
            Active::Loaded(live) if live.generation() == cache.generation()
        )
    }

    fn activate(&self, document: Arc<TaskDocument>) -> Arc<DerivedDataCache> {
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        self.install(&mut slot, document)
    }

    /// Build a fresh cache for `document` and store it in `slot`. The caller
    /// holds the write lock, so generations are handed out in the same order
    /// the caches become live.
    fn install(&self, slot: &mut Active, document: Arc<TaskDocument>) -> Arc<DerivedDataCache> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let tasks = document.tasks.len();
        let cache = Arc::new(DerivedDataCache::new(
            document,
            generation,
            self.config.clone(),
            Arc::clone(&self.parser),
            Arc::clone(&self.area_projector),
        ));
        *slot = Active::Loaded(Arc::clone(&cache));
        info!(generation, tasks, "Activated task-data document");
        cache
    }

    // ------------------------------------------------------------------
    // Queries against the live cache
    // ------------------------------------------------------------------

    pub fn get_range(
        &self,
        series: &SeriesRef,
        key: &str,
        exclude_outliers: bool,
    ) -> Result<Option<ValueRange>> {
        self.active()?.range(series, key, exclude_outliers)
    }

    /// `[min_lon, min_lat, max_lon, max_lat]` of a series.
    pub fn get_bbox(&self, series: &SeriesRef) -> Result<Option<[f64; 4]>> {
        Ok(self.active()?.bbox(series)?.map(|bbox| bbox.to_array()))
    }

    pub fn get_bounding_box(&self, series: &SeriesRef) -> Result<Option<BoundingBox>> {
        self.active()?.bbox(series)
    }

    pub fn get_geojson(&self, series: &SeriesRef, filled: bool) -> Result<Arc<FeatureCollection>> {
        self.active()?.geojson(series, filled)
    }

    pub fn get_raster_bitmap(
        &self,
        grid_id: &str,
        range: Option<ValueRange>,
        palette: &Palette,
    ) -> Result<RasterBitmap> {
        self.active()?.raster_bitmap(grid_id, range, palette)
    }

    pub fn get_value_at_pixel(&self, grid_id: &str, px: usize, py: usize) -> Result<Option<i32>> {
        self.active()?.value_at_pixel(grid_id, px, py)
    }

    pub fn get_grid_info(&self, grid_id: &str) -> Result<Arc<GridInfo>> {
        self.active()?.grid_info(grid_id)
    }

    pub fn get_field_info(&self, series: &SeriesRef, key: &str) -> Result<Option<ValueFieldInfo>> {
        self.active()?.field_info(series, key)
    }

    pub fn get_warnings(&self, series: &SeriesRef) -> Result<Vec<String>> {
        self.active()?.warnings(series)
    }

    pub fn get_default_value_key(&self, series: &SeriesRef) -> Result<Option<String>> {
        self.active()?.default_value_key(series)
    }

    pub fn get_area_geometry(&self, partfield_id: &str) -> Result<Arc<AreaGeometry>> {
        self.active()?.area_geometry(partfield_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let session = Session::default();
        assert_eq!(session.state(), DocumentState::NotLoaded);
        assert_eq!(session.active().unwrap_err(), CacheError::NoActiveDocument);

        let first = session.set_active(TaskDocument::default());
        assert!(session.is_live(&first));
        assert!(matches!(session.state(), DocumentState::Loaded { .. }));

        let second = session.set_active(TaskDocument::default());
        assert!(!session.is_live(&first));
        assert!(session.is_live(&second));

        session.clear();
        assert!(!session.is_live(&second));
        assert_eq!(session.state(), DocumentState::NotLoaded);
    }

    #[test]
    fn test_invalidate_without_document_is_noop() {
        let session = Session::default();
        session.invalidate_all();
        assert_eq!(session.state(), DocumentState::NotLoaded);
    }

    #[test]
    fn test_try_new_validates() {
        let config = CacheConfig {
            raster_parallel_rows: 0,
            ..Default::default()
        };
        assert!(matches!(Session::try_new(config), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_invalidate_keeps_latest_document() {
        let session = Session::default();
        session.set_active(TaskDocument::default());
        session.set_active(test_utils::sample_document());
        session.invalidate_all();

        let live = session.active().unwrap();
        assert_eq!(live.document().tasks.len(), 2);
        assert_eq!(session.state(), DocumentState::Loaded { generation: 3 });
    }

    #[test]
    fn test_concurrent_swaps_keep_newest_generation_live() {
        let session = Session::default();
        session.set_active(TaskDocument::default());

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let session = &session;
                scope.spawn(move || {
                    for _ in 0..50 {
                        if worker % 2 == 0 {
                            session.invalidate_all();
                        } else {
                            session.set_active(test_utils::sample_document());
                        }
                    }
                });
            }
        });

        let live = session.active().unwrap();
        let issued = session.next_generation.load(Ordering::Relaxed) - 1;
        assert_eq!(issued, 401);
        assert_eq!(live.generation(), issued);
        assert!(session.is_live(&live));
    }

    #[test]
    fn test_debug_shows_state() {
        let session = Session::default();
        session.set_active(TaskDocument::default());
        let debug = format!("{:?}", session);
        assert!(debug.contains("Loaded { generation: 1 }"), "{}", debug);
        assert!(debug.contains("next_generation: 2"), "{}", debug);
    }
}
