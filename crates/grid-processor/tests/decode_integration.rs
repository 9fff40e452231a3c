//! Integration tests for grid decoding and range computation against the
//! shared document fixtures.

use grid_processor::{GridCells, PercentileTrim, ValueRangeComputer};
use taskdata_common::{DecodeError, GridSpec};
use test_utils::{
    coded_grid, create_sparse_cells, create_test_cells, dense_grid, sample_document,
};

// =============================================================================
// Dense grids
// =============================================================================

#[test]
fn test_every_in_bounds_cell_decodes() {
    let spec = GridSpec::new(7, 5, 0.0, 0.0, 1.0, 1.0);
    let grid = dense_grid("GRD9", spec, &create_sparse_cells(7, 5, 4));
    let cells = GridCells::from_entity(&grid, &[]).unwrap();

    for y in 0..5 {
        for x in 0..7 {
            let index = y * 7 + x;
            let expected = if index % 4 == 0 {
                None
            } else {
                Some((x * 100 + y + 1) as i32)
            };
            assert_eq!(cells.decode(x, y), expected, "cell ({}, {})", x, y);
        }
    }
}

#[test]
fn test_sample_dense_grid_range() {
    let doc = sample_document();
    let (task, grid) = doc.grid("GRD1").unwrap();
    let cells = GridCells::from_entity(grid, &task.treatment_zones).unwrap();

    let range = ValueRangeComputer::default()
        .compute_grid(&cells, false)
        .unwrap();
    assert_eq!((range.min(), range.max()), (10.0, 60.0));
    assert_eq!(cells.values().count(), 5);
}

#[test]
fn test_truncated_grid_is_decode_error() {
    let spec = GridSpec::new(4, 4, 0.0, 0.0, 1.0, 1.0);
    let mut grid = dense_grid("GRD9", spec, &create_test_cells(4, 4));
    grid.data.truncate(60);

    let err = GridCells::from_entity(&grid, &[]).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::BufferTooShort {
            expected: 64,
            actual: 60
        }
    ));
}

// =============================================================================
// Coded grids
// =============================================================================

#[test]
fn test_sample_coded_grid_resolves_zones() {
    let doc = sample_document();
    let (task, grid) = doc.grid("GRD2").unwrap();
    let cells = GridCells::from_entity(grid, &task.treatment_zones).unwrap();

    // codes [1, 2, 0, 3]: zone 2 maps to 0, code 0 and zone 3 are unmapped
    assert_eq!(cells.decode(0, 0), Some(150));
    assert_eq!(cells.decode(1, 0), None);
    assert_eq!(cells.decode(0, 1), None);
    assert_eq!(cells.decode(1, 1), None);
}

#[test]
fn test_coded_grid_without_zones_is_empty() {
    let grid = coded_grid("GRD9", GridSpec::new(2, 1, 0.0, 0.0, 1.0, 1.0), &[1, 2]);
    let cells = GridCells::from_entity(&grid, &[]).unwrap();
    assert!(cells.value_range().is_none());
}

// =============================================================================
// Outlier exclusion
// =============================================================================

#[test]
fn test_trimmed_range_is_subrange() {
    let mut values: Vec<f64> = (1..=50).map(f64::from).collect();
    values.push(10_000.0);

    for computer in [
        ValueRangeComputer::default(),
        ValueRangeComputer::new(PercentileTrim::default()),
    ] {
        let full = computer.compute(values.clone(), false).unwrap();
        let trimmed = computer.compute(values.clone(), true).unwrap();
        assert!(trimmed.is_within(&full), "{}", computer.strategy_name());
        assert!(trimmed.max() < 10_000.0, "{}", computer.strategy_name());
    }
}
