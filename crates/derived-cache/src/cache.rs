//! Document-scoped cache of derived artifacts.
//!
//! A [`DerivedDataCache`] is bound to one [`TaskDocument`] for its whole
//! life. Every artifact is computed lazily on first request, at most once
//! per key, and dropped only with the cache itself. There is no partial
//! invalidation: a reload builds a new cache.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use grid_processor::{GridCells, ValueRangeComputer};
use renderer::{rasterize, Palette, RasterBitmap};
use serde::Serialize;
use taskdata_common::{
    BoundingBox, DecodeError, EntityId, FeatureCollection, TaskDocument, ValueFieldInfo,
    ValueRange,
};
use timelog::{
    concat_tagged, fill_missing_values, merge_series, project, MergedView, ParsedSeries,
    SeriesParser, TimeLogRecord,
};
use tracing::{debug, warn};

use crate::area::{AreaGeometry, AreaProjector};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::slot_cache::{SlotCache, SlotCacheStats};

/// A merged view of a task's time logs, minus any excluded ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeSpec {
    pub task_id: EntityId,
    pub excluded: BTreeSet<EntityId>,
}

impl MergeSpec {
    pub fn new(task_id: impl Into<EntityId>) -> Self {
        Self {
            task_id: task_id.into(),
            excluded: BTreeSet::new(),
        }
    }

    pub fn excluding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityId>,
    {
        self.excluded.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// A single time log or a merged view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesRef {
    Single(EntityId),
    Merged(MergeSpec),
}

impl SeriesRef {
    pub fn single(id: impl Into<EntityId>) -> Self {
        Self::Single(id.into())
    }

    pub fn merged(task_id: impl Into<EntityId>) -> Self {
        Self::Merged(MergeSpec::new(task_id))
    }
}

impl fmt::Display for SeriesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRef::Single(id) => write!(f, "{}", id),
            SeriesRef::Merged(spec) if spec.excluded.is_empty() => {
                write!(f, "merged:{}", spec.task_id)
            }
            SeriesRef::Merged(spec) => {
                let excluded: Vec<&str> = spec.excluded.iter().map(String::as_str).collect();
                write!(f, "merged:{}-{}", spec.task_id, excluded.join(","))
            }
        }
    }
}

/// Load-time information about a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridInfo {
    pub id: EntityId,
    pub n_cols: usize,
    pub n_rows: usize,
    pub bounds: BoundingBox,
    /// Full range over all data cells, `None` if every cell is no-data.
    pub range: Option<ValueRange>,
    pub value_info: Option<ValueFieldInfo>,
}

/// Per-sub-cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub generation: u64,
    pub caches: Vec<(&'static str, SlotCacheStats)>,
}

impl CacheStats {
    pub fn get(&self, name: &str) -> Option<SlotCacheStats> {
        self.caches
            .iter()
            .find(|(cache, _)| *cache == name)
            .map(|(_, stats)| *stats)
    }
}

pub struct DerivedDataCache {
    document: Arc<TaskDocument>,
    generation: u64,
    config: CacheConfig,
    parser: Arc<dyn SeriesParser>,
    area_projector: Arc<dyn AreaProjector>,
    ranges: ValueRangeComputer,

    parsed: SlotCache<EntityId, Arc<ParsedSeries>>,
    filled: SlotCache<EntityId, Arc<Vec<TimeLogRecord>>>,
    merged: SlotCache<MergeSpec, Arc<MergedView>>,
    features: SlotCache<(SeriesRef, bool), Arc<FeatureCollection>>,
    trimmed_ranges: SlotCache<(SeriesRef, String), Option<ValueRange>>,
    grids: SlotCache<EntityId, std::result::Result<Arc<GridInfo>, DecodeError>>,
    areas: SlotCache<EntityId, Arc<AreaGeometry>>,
}

impl DerivedDataCache {
    pub fn new(
        document: Arc<TaskDocument>,
        generation: u64,
        config: CacheConfig,
        parser: Arc<dyn SeriesParser>,
        area_projector: Arc<dyn AreaProjector>,
    ) -> Self {
        let ranges = config.range_computer();
        Self {
            document,
            generation,
            config,
            parser,
            area_projector,
            ranges,
            parsed: SlotCache::new("parsed"),
            filled: SlotCache::new("filled"),
            merged: SlotCache::new("merged"),
            features: SlotCache::new("features"),
            trimmed_ranges: SlotCache::new("trimmed_ranges"),
            grids: SlotCache::new("grids"),
            areas: SlotCache::new("areas"),
        }
    }

    pub fn document(&self) -> &TaskDocument {
        &self.document
    }

    /// Shared handle to the document, for rebuilding a fresh cache over it.
    pub fn document_arc(&self) -> Arc<TaskDocument> {
        Arc::clone(&self.document)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Time logs
    // ------------------------------------------------------------------

    /// Parse result of one time log. A decode failure is cached as an empty
    /// result carrying the failure as its warning.
    pub fn parsed_series(&self, id: &str) -> Result<Arc<ParsedSeries>> {
        let log = self
            .document
            .time_log(id)
            .ok_or_else(|| CacheError::not_found("time log", id))?;

        Ok(self
            .parsed
            .get_or_compute(&log.id, || Arc::new(timelog::parse_series(self.parser.as_ref(), log))))
    }

    /// Records of one time log with field gaps filled. Kept apart from the
    /// raw parse result, which stays untouched.
    pub fn filled_records(&self, id: &str) -> Result<Arc<Vec<TimeLogRecord>>> {
        let parsed = self.parsed_series(id)?;
        Ok(self
            .filled
            .get_or_compute(&id.to_string(), || Arc::new(fill_missing_values(&parsed.records))))
    }

    /// Time log ids merged by `spec`, in task order.
    pub fn merge_members(&self, spec: &MergeSpec) -> Result<Vec<EntityId>> {
        let task = self
            .document
            .task(&spec.task_id)
            .ok_or_else(|| CacheError::not_found("task", spec.task_id.as_str()))?;
        Ok(task
            .time_logs
            .iter()
            .map(|log| log.id.clone())
            .filter(|id| !spec.excluded.contains(id))
            .collect())
    }

    pub fn merged_view(&self, spec: &MergeSpec) -> Result<Arc<MergedView>> {
        let members = self.merge_members(spec)?;
        let parsed = members
            .iter()
            .map(|id| self.parsed_series(id))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.merged.get_or_compute(spec, || {
            let view = merge_series(
                members
                    .iter()
                    .map(String::as_str)
                    .zip(parsed.iter().map(Arc::as_ref)),
            );
            debug!(task = %spec.task_id, members = members.len(), "Merged time logs");
            Arc::new(view)
        }))
    }

    /// Point features of a series. Merged views concatenate the cached
    /// features of their members, each tagged with its origin.
    pub fn geojson(&self, series: &SeriesRef, filled: bool) -> Result<Arc<FeatureCollection>> {
        let key = (series.clone(), filled);
        if let Some(features) = self.features.get(&key) {
            return Ok(features);
        }

        let features = match series {
            SeriesRef::Single(id) if filled => {
                let records = self.filled_records(id)?;
                self.features
                    .get_or_compute(&key, || Arc::new(project(&records)))
            }
            SeriesRef::Single(id) => {
                let parsed = self.parsed_series(id)?;
                self.features
                    .get_or_compute(&key, || Arc::new(project(&parsed.records)))
            }
            SeriesRef::Merged(spec) => {
                let members = self.merge_members(spec)?;
                let parts = members
                    .iter()
                    .map(|id| self.geojson(&SeriesRef::single(id.as_str()), filled))
                    .collect::<Result<Vec<_>>>()?;
                self.features.get_or_compute(&key, || {
                    Arc::new(concat_tagged(
                        members
                            .iter()
                            .map(String::as_str)
                            .zip(parts.iter().map(Arc::as_ref)),
                    ))
                })
            }
        };

        Ok(features)
    }

    pub fn bbox(&self, series: &SeriesRef) -> Result<Option<BoundingBox>> {
        match series {
            SeriesRef::Single(id) => Ok(self.parsed_series(id)?.bbox),
            SeriesRef::Merged(spec) => Ok(self.merged_view(spec)?.bbox),
        }
    }

    pub fn field_infos(&self, series: &SeriesRef) -> Result<Vec<ValueFieldInfo>> {
        match series {
            SeriesRef::Single(id) => Ok(self.parsed_series(id)?.field_infos.clone()),
            SeriesRef::Merged(spec) => Ok(self.merged_view(spec)?.field_infos.clone()),
        }
    }

    pub fn field_info(&self, series: &SeriesRef, key: &str) -> Result<Option<ValueFieldInfo>> {
        Ok(self
            .field_infos(series)?
            .into_iter()
            .find(|info| info.key == key))
    }

    pub fn default_value_key(&self, series: &SeriesRef) -> Result<Option<String>> {
        Ok(timelog::default_value_key(&self.field_infos(series)?).map(str::to_string))
    }

    /// Warnings recorded while parsing or merging. Merged warnings are
    /// prefixed with their origin series.
    pub fn warnings(&self, series: &SeriesRef) -> Result<Vec<String>> {
        match series {
            SeriesRef::Single(id) => Ok(self.parsed_series(id)?.warnings.clone()),
            SeriesRef::Merged(spec) => Ok(self
                .merged_view(spec)?
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect()),
        }
    }

    /// Range of one field. With `exclude_outliers` the trimmed range is
    /// computed once per series and field, and is always inside the full
    /// range.
    pub fn range(
        &self,
        series: &SeriesRef,
        key: &str,
        exclude_outliers: bool,
    ) -> Result<Option<ValueRange>> {
        if !exclude_outliers {
            return Ok(self.field_info(series, key)?.and_then(|info| info.range));
        }

        let members = match series {
            SeriesRef::Single(id) => vec![id.clone()],
            SeriesRef::Merged(spec) => self.merge_members(spec)?,
        };
        let parsed = members
            .iter()
            .map(|id| self.parsed_series(id))
            .collect::<Result<Vec<_>>>()?;

        Ok(self
            .trimmed_ranges
            .get_or_compute(&(series.clone(), key.to_string()), || {
                self.ranges.compute(
                    parsed.iter().flat_map(|series| series.field_values(key)),
                    true,
                )
            }))
    }

    // ------------------------------------------------------------------
    // Grids
    // ------------------------------------------------------------------

    fn grid_cells(&self, id: &str) -> Result<GridCells<'_>> {
        let (task, grid) = self
            .document
            .grid(id)
            .ok_or_else(|| CacheError::not_found("grid", id))?;
        GridCells::from_entity(grid, &task.treatment_zones).map_err(|source| CacheError::Decode {
            id: id.to_string(),
            source,
        })
    }

    /// Dimensions, bounds, full value range and value description of a grid.
    pub fn grid_info(&self, id: &str) -> Result<Arc<GridInfo>> {
        let (task, grid) = self
            .document
            .grid(id)
            .ok_or_else(|| CacheError::not_found("grid", id))?;

        self.grids
            .get_or_compute(&grid.id, || {
                match GridCells::from_entity(grid, &task.treatment_zones) {
                    Ok(cells) => Ok(Arc::new(GridInfo {
                        id: grid.id.clone(),
                        n_cols: grid.spec.n_cols,
                        n_rows: grid.spec.n_rows,
                        bounds: grid.spec.bounds(),
                        range: self.ranges.compute_grid(&cells, false),
                        value_info: grid.value_info.clone(),
                    })),
                    Err(err) => {
                        warn!(grid = %grid.id, error = %err, "Failed to decode grid");
                        Err(err)
                    }
                }
            })
            .map_err(|source| CacheError::Decode {
                id: id.to_string(),
                source,
            })
    }

    /// Color-mapped bitmap of a grid. Without an explicit range the grid's
    /// full range is used.
    pub fn raster_bitmap(
        &self,
        id: &str,
        range: Option<ValueRange>,
        palette: &Palette,
    ) -> Result<RasterBitmap> {
        let info = self.grid_info(id)?;
        let cells = self.grid_cells(id)?;
        // a grid without data renders fully transparent whatever the range
        let range = range
            .or(info.range)
            .unwrap_or_else(|| ValueRange::point(0.0));
        Ok(rasterize(
            &cells,
            range,
            palette,
            self.config.raster_parallel_rows,
        ))
    }

    /// Grid value shown at screen pixel `(px, py)`; `None` for no-data or a
    /// pixel outside the grid.
    pub fn value_at_pixel(&self, id: &str, px: usize, py: usize) -> Result<Option<i32>> {
        let cells = self.grid_cells(id)?;
        Ok(renderer::pixel_value(&cells, px, py))
    }

    // ------------------------------------------------------------------
    // Areas
    // ------------------------------------------------------------------

    pub fn area_geometry(&self, id: &str) -> Result<Arc<AreaGeometry>> {
        let partfield = self
            .document
            .partfield(id)
            .ok_or_else(|| CacheError::not_found("partfield", id))?;
        Ok(self.areas.get_or_compute(&partfield.id, || {
            Arc::new(self.area_projector.to_geojson(partfield))
        }))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            generation: self.generation,
            caches: vec![
                (self.parsed.name(), self.parsed.stats()),
                (self.filled.name(), self.filled.stats()),
                (self.merged.name(), self.merged.stats()),
                (self.features.name(), self.features.stats()),
                (self.trimmed_ranges.name(), self.trimmed_ranges.stats()),
                (self.grids.name(), self.grids.stats()),
                (self.areas.name(), self.areas.stats()),
            ],
        }
    }
}

impl fmt::Debug for DerivedDataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedDataCache")
            .field("generation", &self.generation)
            .field("tasks", &self.document.tasks.len())
            .finish()
    }
}
