//! Command implementations of the `taskdata` tool.
//!
//! Every command loads one container into a [`Session`] and answers from its
//! derived-data cache, so the binary stays a thin argument parser.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use derived_cache::{CacheConfig, CacheError, MergeSpec, SeriesRef, Session};
use ingestion::JsonContainerIngestion;
use renderer::Palette;
use serde::Serialize;
use taskdata_common::ValueRange;
use tracing::{info, warn};

/// Read a container from disk and make it the session's active document.
pub fn load_session(path: &Path, config: CacheConfig) -> Result<Session> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read container {}", path.display()))?;
    let session = Session::try_new(config)?;
    session.load_container(&JsonContainerIngestion, &bytes)?;
    info!(path = %path.display(), "Loaded container");
    Ok(session)
}

/// Resolve a palette argument: a built-in name or a JSON palette file.
pub fn resolve_palette(name_or_path: Option<&str>) -> Result<Palette> {
    match name_or_path {
        None => Ok(Palette::default()),
        Some(name) => match Palette::builtin(name) {
            Some(palette) => Ok(palette),
            None => Palette::from_file(name)
                .with_context(|| format!("unknown palette {}", name)),
        },
    }
}

/// Pick a single series or a task's merged series.
pub fn series_ref(series: Option<&str>, task: Option<&str>, exclude: &[String]) -> Result<SeriesRef> {
    match (series, task) {
        (Some(id), None) => Ok(SeriesRef::single(id)),
        (None, Some(task)) => Ok(SeriesRef::Merged(
            MergeSpec::new(task).excluding(exclude.iter().cloned()),
        )),
        _ => Err(anyhow!("exactly one of --series or --task is required")),
    }
}

// ============================================================================
// summary
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub designator: Option<String>,
    pub grid: Option<derived_cache::GridInfo>,
    /// Set when the task's grid fails to decode; the rest of the summary
    /// is still reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_error: Option<String>,
    pub merged: SeriesSummary,
    pub series: Vec<SeriesSummary>,
}

#[derive(Debug, Serialize)]
pub struct SeriesSummary {
    pub id: String,
    pub bbox: Option<[f64; 4]>,
    pub default_value_key: Option<String>,
    pub range: Option<ValueRange>,
    pub warnings: Vec<String>,
}

fn series_summary(session: &Session, id: String, series: &SeriesRef) -> Result<SeriesSummary> {
    let default_value_key = session.get_default_value_key(series)?;
    let range = match &default_value_key {
        Some(key) => session.get_range(series, key, false)?,
        None => None,
    };
    Ok(SeriesSummary {
        id,
        bbox: session.get_bbox(series)?,
        default_value_key,
        range,
        warnings: session.get_warnings(series)?,
    })
}

pub fn summarize(session: &Session) -> Result<DocumentSummary> {
    let cache = session.active()?;
    let mut tasks = Vec::new();
    for task in &cache.document().tasks {
        let (grid, grid_error) = match &task.grid {
            Some(grid) => match session.get_grid_info(&grid.id) {
                Ok(info) => (Some(info.as_ref().clone()), None),
                Err(err @ CacheError::Decode { .. }) => {
                    warn!(task = %task.id, error = %err, "Grid not summarized");
                    (None, Some(err.to_string()))
                }
                Err(err) => return Err(err.into()),
            },
            None => (None, None),
        };
        let series = task
            .time_logs
            .iter()
            .map(|log| series_summary(session, log.id.clone(), &SeriesRef::single(log.id.as_str())))
            .collect::<Result<Vec<_>>>()?;
        let merged_ref = SeriesRef::merged(task.id.as_str());
        tasks.push(TaskSummary {
            id: task.id.clone(),
            designator: task.designator.clone(),
            grid,
            grid_error,
            merged: series_summary(session, merged_ref.to_string(), &merged_ref)?,
            series,
        });
    }
    Ok(DocumentSummary { tasks })
}

// ============================================================================
// raster
// ============================================================================

/// Render a grid to a PNG file. Returns the bitmap's `(width, height)`.
pub fn export_raster(
    session: &Session,
    grid_id: &str,
    range: Option<ValueRange>,
    palette: &Palette,
    output: &Path,
) -> Result<(usize, usize)> {
    let bitmap = session.get_raster_bitmap(grid_id, range, palette)?;
    let png = bitmap.to_png()?;
    fs::write(output, png).with_context(|| format!("failed to write {}", output.display()))?;
    info!(grid = grid_id, output = %output.display(), "Wrote raster");
    Ok((bitmap.width, bitmap.height))
}

// ============================================================================
// geojson
// ============================================================================

/// Serialize a series' point features.
pub fn geojson_string(session: &Session, series: &SeriesRef, filled: bool) -> Result<String> {
    let features = session.get_geojson(series, filled)?;
    Ok(serde_json::to_string_pretty(features.as_ref())?)
}
