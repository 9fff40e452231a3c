//! JSON container front end.

use std::collections::HashSet;

use taskdata_common::{
    GridCellType, GridEntity, GridSpec, IngestionError, Partfield, ProcessDataValue, Task,
    TaskDocument, TimeLogEntity, TreatmentZone, ValueFieldInfo,
};
use tracing::{debug, info, warn};

use crate::container::{
    ContainerDocument, ContainerGrid, ContainerPartfield, ContainerProcessValue, ContainerTask,
    ContainerTimeLog, ContainerValue, ContainerZone, CONTAINER_VERSION,
};
use crate::{FileIngestion, Result};

/// Reads and writes the JSON task-data container.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContainerIngestion;

impl FileIngestion for JsonContainerIngestion {
    fn parse_container(&self, bytes: &[u8]) -> Result<TaskDocument> {
        let container: ContainerDocument = serde_json::from_slice(bytes)
            .map_err(|e| IngestionError::single(format!("malformed container: {}", e)))?;
        let document = build_document(container)?;
        info!(
            tasks = document.tasks.len(),
            partfields = document.partfields.len(),
            time_logs = document.time_logs().count(),
            "Ingested task-data container"
        );
        Ok(document)
    }
}

impl JsonContainerIngestion {
    /// Serialize `document` into the container format.
    pub fn write_container(&self, document: &TaskDocument) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&to_container(document))
    }
}

/// Validate a deserialized container and convert it into a document,
/// collecting every problem found.
fn build_document(container: ContainerDocument) -> Result<TaskDocument> {
    let mut reasons = Vec::new();

    if container.version != CONTAINER_VERSION {
        reasons.push(format!(
            "unsupported container version {} (expected {})",
            container.version, CONTAINER_VERSION
        ));
    }
    if container.tasks.is_empty() {
        reasons.push("container holds no tasks".to_string());
    }

    let mut seen = HashSet::new();
    let ids = container
        .tasks
        .iter()
        .flat_map(|task| {
            std::iter::once(task.id.as_str())
                .chain(task.grid.as_ref().map(|grid| grid.id.as_str()))
                .chain(task.time_logs.iter().map(|log| log.id.as_str()))
        })
        .chain(container.partfields.iter().map(|pfd| pfd.id.as_str()));
    for id in ids {
        if id.is_empty() {
            reasons.push("entity with an empty id".to_string());
        } else if !seen.insert(id) {
            reasons.push(format!("duplicate entity id {}", id));
        }
    }

    let partfield_ids: HashSet<&str> = container.partfields.iter().map(|p| p.id.as_str()).collect();
    for task in &container.tasks {
        if let Some(pfd) = &task.partfield {
            if !partfield_ids.contains(pfd.as_str()) {
                reasons.push(format!("task {} references unknown partfield {}", task.id, pfd));
            }
        }
        if let Some(grid) = &task.grid {
            check_grid(grid, &mut reasons);
        }
    }

    if !reasons.is_empty() {
        warn!(count = reasons.len(), "Rejected task-data container");
        return Err(IngestionError::new(reasons));
    }

    let mut tasks = Vec::with_capacity(container.tasks.len());
    for task in container.tasks {
        tasks.push(build_task(task)?);
    }
    Ok(TaskDocument {
        tasks,
        partfields: container.partfields.into_iter().map(build_partfield).collect(),
    })
}

/// Header-level grid checks. A cell buffer shorter than the dimensions
/// require is left to the decoder, which fails that grid alone.
fn check_grid(grid: &ContainerGrid, reasons: &mut Vec<String>) {
    let cell_size = match GridCellType::from_tag(grid.cell_type) {
        Ok(cell_type) => cell_type.cell_size(),
        Err(e) => {
            reasons.push(format!("grid {}: {}", grid.id, e));
            GridCellType::Dense.cell_size()
        }
    };
    if grid.n_cols == 0 || grid.n_rows == 0 {
        reasons.push(format!("grid {} has no cells", grid.id));
    }
    let addressable = grid
        .n_cols
        .checked_mul(grid.n_rows)
        .and_then(|cells| cells.checked_mul(cell_size))
        .is_some();
    if !addressable {
        reasons.push(format!(
            "grid {} dimensions {}x{} are too large",
            grid.id, grid.n_cols, grid.n_rows
        ));
    }
    let sizes_ok = [grid.cell_east, grid.cell_north]
        .iter()
        .all(|size| size.is_finite() && *size > 0.0);
    if !sizes_ok || !grid.min_east.is_finite() || !grid.min_north.is_finite() {
        reasons.push(format!("grid {} has an invalid georeference", grid.id));
    }
}

fn build_task(task: ContainerTask) -> Result<Task> {
    let grid = match task.grid {
        Some(grid) => Some(build_grid(grid)?),
        None => None,
    };
    debug!(task = %task.id, time_logs = task.time_logs.len(), "Built task");
    Ok(Task {
        id: task.id,
        designator: task.designator,
        partfield_id: task.partfield,
        grid,
        treatment_zones: task.treatment_zones.into_iter().map(build_zone).collect(),
        time_logs: task.time_logs.into_iter().map(build_time_log).collect(),
    })
}

fn build_grid(grid: ContainerGrid) -> Result<GridEntity> {
    let cell_type = GridCellType::from_tag(grid.cell_type)
        .map_err(|e| IngestionError::single(format!("grid {}: {}", grid.id, e)))?;
    let value_info = grid.value.map(|value| {
        ValueFieldInfo::new(value.ddi, value.device_element_id.as_deref())
            .with_presentation(&value.presentation)
    });
    Ok(GridEntity {
        id: grid.id,
        spec: GridSpec::new(
            grid.n_cols,
            grid.n_rows,
            grid.min_east,
            grid.min_north,
            grid.cell_east,
            grid.cell_north,
        ),
        cell_type,
        data: grid.data,
        value_info,
    })
}

fn build_zone(zone: ContainerZone) -> TreatmentZone {
    TreatmentZone {
        code: zone.code,
        designator: zone.designator,
        values: zone
            .values
            .into_iter()
            .map(|pdv| ProcessDataValue {
                ddi: pdv.ddi,
                value: pdv.value,
            })
            .collect(),
    }
}

fn build_time_log(log: ContainerTimeLog) -> TimeLogEntity {
    TimeLogEntity {
        id: log.id,
        header: log.header,
        data: log.data,
    }
}

fn build_partfield(pfd: ContainerPartfield) -> Partfield {
    Partfield {
        id: pfd.id,
        designator: pfd.designator,
        polygons: pfd.polygons,
    }
}

fn to_container(document: &TaskDocument) -> ContainerDocument {
    ContainerDocument {
        version: CONTAINER_VERSION,
        tasks: document
            .tasks
            .iter()
            .map(|task| ContainerTask {
                id: task.id.clone(),
                designator: task.designator.clone(),
                partfield: task.partfield_id.clone(),
                grid: task.grid.as_ref().map(|grid| ContainerGrid {
                    id: grid.id.clone(),
                    n_cols: grid.spec.n_cols,
                    n_rows: grid.spec.n_rows,
                    min_east: grid.spec.min_east,
                    min_north: grid.spec.min_north,
                    cell_east: grid.spec.cell_east,
                    cell_north: grid.spec.cell_north,
                    cell_type: match grid.cell_type {
                        GridCellType::Coded => 1,
                        GridCellType::Dense => 2,
                    },
                    data: grid.data.clone(),
                    value: grid.value_info.as_ref().map(|info| ContainerValue {
                        ddi: info.ddi,
                        device_element_id: info.device_element_id.clone(),
                        presentation: info.presentation(),
                    }),
                }),
                treatment_zones: task
                    .treatment_zones
                    .iter()
                    .map(|zone| ContainerZone {
                        code: zone.code,
                        designator: zone.designator.clone(),
                        values: zone
                            .values
                            .iter()
                            .map(|pdv| ContainerProcessValue {
                                ddi: pdv.ddi,
                                value: pdv.value,
                            })
                            .collect(),
                    })
                    .collect(),
                time_logs: task
                    .time_logs
                    .iter()
                    .map(|log| ContainerTimeLog {
                        id: log.id.clone(),
                        header: log.header.clone(),
                        data: log.data.clone(),
                    })
                    .collect(),
            })
            .collect(),
        partfields: document
            .partfields
            .iter()
            .map(|pfd| ContainerPartfield {
                id: pfd.id.clone(),
                designator: pfd.designator.clone(),
                polygons: pfd.polygons.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_json() {
        let err = JsonContainerIngestion.parse_container(b"{not json").unwrap_err();
        assert_eq!(err.reasons.len(), 1);
        assert!(err.reasons[0].starts_with("malformed container"));
    }

    #[test]
    fn test_collects_every_reason() {
        let json = r#"{
            "version": 7,
            "tasks": [
                {"id": "TSK1", "partfield": "PFD9"},
                {"id": "TSK1"}
            ]
        }"#;
        let err = JsonContainerIngestion
            .parse_container(json.as_bytes())
            .unwrap_err();
        assert_eq!(err.reasons.len(), 3);
        assert!(err.reasons.iter().any(|r| r.contains("version 7")));
        assert!(err.reasons.iter().any(|r| r == "duplicate entity id TSK1"));
        assert!(err.reasons.iter().any(|r| r.contains("unknown partfield PFD9")));
    }

    #[test]
    fn test_empty_container_rejected() {
        let err = JsonContainerIngestion
            .parse_container(br#"{"version": 1}"#)
            .unwrap_err();
        assert_eq!(err.reasons, vec!["container holds no tasks".to_string()]);
    }

    #[test]
    fn test_bad_grid_header() {
        let json = r#"{
            "version": 1,
            "tasks": [{"id": "TSK1", "grid": {
                "id": "GRD1", "n_cols": 0, "n_rows": 2,
                "min_east": 0.0, "min_north": 0.0, "cell_east": -1.0, "cell_north": 1.0,
                "cell_type": 9, "data": ""
            }}]
        }"#;
        let err = JsonContainerIngestion
            .parse_container(json.as_bytes())
            .unwrap_err();
        assert_eq!(err.reasons.len(), 3);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let json = r#"{
            "version": 1,
            "tasks": [{"id": "TSK1", "grid": {
                "id": "GRD1", "n_cols": 4294967296, "n_rows": 4294967296,
                "min_east": 0.0, "min_north": 0.0, "cell_east": 1.0, "cell_north": 1.0,
                "cell_type": 2, "data": "AAAAAA=="
            }}]
        }"#;
        let err = JsonContainerIngestion
            .parse_container(json.as_bytes())
            .unwrap_err();
        assert_eq!(err.reasons.len(), 1);
        assert!(err.reasons[0].contains("too large"), "{:?}", err.reasons);
    }
}
