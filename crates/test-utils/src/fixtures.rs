//! Common test fixtures for task-data tests.
//!
//! [`sample_document`] builds a small but complete document:
//!
//! - `TSK1` owns the dense grid `GRD1` (3x2, 1 degree cells at the origin),
//!   time logs `TLG00001` and `TLG00002`, and the partfield `PFD1`.
//! - `TSK2` owns the coded grid `GRD2` (2x2) with its treatment zones and a
//!   truncated time log `TLG00003`.
//!
//! `TLG00001` covers `[0,0,1,1]` and contains one record without a GNSS fix
//! far outside that box. `TLG00002` covers `[2,2,3,3]` and has a gap in the
//! middle record.

use taskdata_common::{
    DataLogValueSpec, GridCellType, GridEntity, GridSpec, Partfield, ProcessDataValue, Task,
    TaskDocument, TimeLogEntity, TimeLogHeader, TreatmentZone, ValueFieldInfo, ValuePresentation,
};

use crate::generators::{dense_grid_bytes, encode_time_log, header_with_status, TestRecord};

/// Value key of the single logged field in the sample time logs.
pub const RATE_KEY: &str = "0084_DET-1";

/// Cells of `GRD1`, storage order (southern row first). One no-data cell.
pub const SAMPLE_GRID_CELLS: [i32; 6] = [10, 0, 30, 40, 50, 60];

/// Zone codes of `GRD2`, storage order.
pub const SAMPLE_ZONE_CODES: [u8; 4] = [1, 2, 0, 3];

/// Header with logged status and one data log value, DDI 0x0084 on `DET-1`.
pub fn rate_header() -> TimeLogHeader {
    let mut dlv = DataLogValueSpec::new(0x0084, "DET-1");
    dlv.device_element_designator = Some("Boom".to_string());
    dlv.name = Some("Actual Volume Per Area Application Rate".to_string());
    dlv.presentation = ValuePresentation {
        scale: 0.01,
        offset: 0.0,
        decimals: 2,
        unit: Some("l/ha".to_string()),
    };
    header_with_status(vec![dlv])
}

/// A time log entity encoded from `records`.
pub fn time_log(id: &str, header: TimeLogHeader, records: &[TestRecord]) -> TimeLogEntity {
    let data = encode_time_log(&header, records);
    TimeLogEntity {
        id: id.to_string(),
        header,
        data,
    }
}

/// A dense grid entity holding `cells`.
pub fn dense_grid(id: &str, spec: GridSpec, cells: &[i32]) -> GridEntity {
    GridEntity {
        id: id.to_string(),
        spec,
        cell_type: GridCellType::Dense,
        data: dense_grid_bytes(cells),
        value_info: None,
    }
}

/// A coded grid entity holding `codes`.
pub fn coded_grid(id: &str, spec: GridSpec, codes: &[u8]) -> GridEntity {
    GridEntity {
        id: id.to_string(),
        spec,
        cell_type: GridCellType::Coded,
        data: codes.to_vec(),
        value_info: None,
    }
}

/// A task with no grid, zones or time logs.
pub fn empty_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        designator: None,
        partfield_id: None,
        grid: None,
        treatment_zones: Vec::new(),
        time_logs: Vec::new(),
    }
}

pub fn zone(code: u8, value: Option<i32>) -> TreatmentZone {
    TreatmentZone {
        code,
        designator: Some(format!("Zone {}", code)),
        values: value
            .map(|value| vec![ProcessDataValue { ddi: 0x0006, value }])
            .unwrap_or_default(),
    }
}

/// Records of `TLG00001`: two fixed positions and one without a fix.
pub fn first_series_records() -> Vec<TestRecord> {
    vec![
        TestRecord::at(1_000, 0.0, 0.0).with_value(0, 100),
        TestRecord::at(2_000, 50.0, 50.0)
            .with_status(0)
            .with_value(0, 999),
        TestRecord::at(3_000, 1.0, 1.0).with_value(0, 300),
    ]
}

/// Records of `TLG00002`: the middle record logs no value.
pub fn second_series_records() -> Vec<TestRecord> {
    vec![
        TestRecord::at(0, 2.0, 2.0).with_value(0, 200),
        TestRecord::at(1_000, 2.5, 2.5),
        TestRecord::at(2_000, 3.0, 3.0).with_value(0, 400),
    ]
}

pub fn sample_document() -> TaskDocument {
    let mut tsk1 = empty_task("TSK1");
    tsk1.designator = Some("Spraying".to_string());
    tsk1.partfield_id = Some("PFD1".to_string());
    let mut grd1 = dense_grid(
        "GRD1",
        GridSpec::new(3, 2, 0.0, 0.0, 1.0, 1.0),
        &SAMPLE_GRID_CELLS,
    );
    grd1.value_info = Some(ValueFieldInfo::new(0x0006, None));
    tsk1.grid = Some(grd1);
    tsk1.time_logs = vec![
        time_log("TLG00001", rate_header(), &first_series_records()),
        time_log("TLG00002", rate_header(), &second_series_records()),
    ];

    let mut tsk2 = empty_task("TSK2");
    tsk2.grid = Some(coded_grid(
        "GRD2",
        GridSpec::new(2, 2, 10.0, 10.0, 0.5, 0.5),
        &SAMPLE_ZONE_CODES,
    ));
    tsk2.treatment_zones = vec![zone(1, Some(150)), zone(2, Some(0)), zone(3, None)];
    let mut broken = time_log(
        "TLG00003",
        rate_header(),
        &[TestRecord::at(0, 5.0, 5.0).with_value(0, 1)],
    );
    broken.data.truncate(broken.data.len() - 2);
    tsk2.time_logs = vec![broken];

    TaskDocument {
        tasks: vec![tsk1, tsk2],
        partfields: vec![Partfield {
            id: "PFD1".to_string(),
            designator: Some("North field".to_string()),
            polygons: vec![vec![vec![
                [0.0, 0.0],
                [3.0, 0.0],
                [3.0, 3.0],
                [0.0, 3.0],
                [0.0, 0.0],
            ]]],
        }],
    }
}
