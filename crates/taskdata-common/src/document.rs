//! Read-only task-data entity tree.
//!
//! Produced by an ingestion front end and never mutated afterwards. Every
//! derived artifact is keyed by the [`EntityId`] of the entity it came from.

use crate::grid::{GridCellType, GridSpec};
use crate::time_log::TimeLogHeader;
use crate::value_info::ValueFieldInfo;

/// Stable identifier of an entity within one document.
pub type EntityId = String;

/// Root of a loaded task-data file.
#[derive(Debug, Clone, Default)]
pub struct TaskDocument {
    pub tasks: Vec<Task>,
    pub partfields: Vec<Partfield>,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: EntityId,
    pub designator: Option<String>,
    pub partfield_id: Option<EntityId>,
    pub grid: Option<GridEntity>,
    pub treatment_zones: Vec<TreatmentZone>,
    pub time_logs: Vec<TimeLogEntity>,
}

#[derive(Debug, Clone)]
pub struct GridEntity {
    pub id: EntityId,
    pub spec: GridSpec,
    pub cell_type: GridCellType,
    /// Raw cell buffer, row-major, southernmost row first.
    pub data: Vec<u8>,
    /// Description of the gridded value, when the document provides one.
    pub value_info: Option<ValueFieldInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentZone {
    pub code: u8,
    pub designator: Option<String>,
    pub values: Vec<ProcessDataValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessDataValue {
    pub ddi: u16,
    pub value: i32,
}

/// One device time series: header plus binary record payload.
#[derive(Debug, Clone)]
pub struct TimeLogEntity {
    pub id: EntityId,
    pub header: TimeLogHeader,
    pub data: Vec<u8>,
}

/// A field boundary; polygons are lists of `[lon, lat]` rings, exterior first.
#[derive(Debug, Clone)]
pub struct Partfield {
    pub id: EntityId,
    pub designator: Option<String>,
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

/// Borrowed view of any entity, as returned by [`TaskDocument::entity`].
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Task(&'a Task),
    Grid(&'a GridEntity),
    TimeLog(&'a TimeLogEntity),
    Partfield(&'a Partfield),
}

impl TaskDocument {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// A grid together with the task that owns it (the task carries the
    /// zone definitions coded grids resolve against).
    pub fn grid(&self, id: &str) -> Option<(&Task, &GridEntity)> {
        self.tasks.iter().find_map(|task| {
            task.grid
                .as_ref()
                .filter(|grid| grid.id == id)
                .map(|grid| (task, grid))
        })
    }

    pub fn time_log(&self, id: &str) -> Option<&TimeLogEntity> {
        self.time_logs().find(|log| log.id == id)
    }

    pub fn task_of_time_log(&self, id: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|task| task.time_logs.iter().any(|log| log.id == id))
    }

    pub fn partfield(&self, id: &str) -> Option<&Partfield> {
        self.partfields.iter().find(|pfd| pfd.id == id)
    }

    pub fn grids(&self) -> impl Iterator<Item = &GridEntity> {
        self.tasks.iter().filter_map(|task| task.grid.as_ref())
    }

    pub fn time_logs(&self) -> impl Iterator<Item = &TimeLogEntity> {
        self.tasks.iter().flat_map(|task| task.time_logs.iter())
    }

    /// Look up any entity by id.
    pub fn entity(&self, id: &str) -> Option<EntityRef<'_>> {
        if let Some(task) = self.task(id) {
            return Some(EntityRef::Task(task));
        }
        if let Some((_, grid)) = self.grid(id) {
            return Some(EntityRef::Grid(grid));
        }
        if let Some(log) = self.time_log(id) {
            return Some(EntityRef::TimeLog(log));
        }
        self.partfield(id).map(EntityRef::Partfield)
    }
}
