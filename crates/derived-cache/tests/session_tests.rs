//! Session and cache behaviour over the shared sample document.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use derived_cache::{CacheError, DocumentState, MergeSpec, SeriesRef, Session};
use ingestion::{FileIngestion, JsonContainerIngestion};
use renderer::{Color, ColorScale, Palette};
use taskdata_common::{DecodeResult, GridSpec, TaskDocument, TimeLogEntity};
use test_utils::{
    assert_coords_approx_eq, create_constant_cells, dense_grid, empty_task, sample_document,
    RATE_KEY,
};
use timelog::{BinaryTimeLogParser, SeriesParser, TimeLogRecord};

/// Binary parser that counts how often it runs.
#[derive(Default)]
struct CountingParser {
    calls: AtomicUsize,
}

impl CountingParser {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SeriesParser for CountingParser {
    fn parse_records(&self, log: &TimeLogEntity) -> DecodeResult<Vec<TimeLogRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        BinaryTimeLogParser.parse_records(log)
    }
}

fn counted_session() -> (Session, Arc<CountingParser>) {
    let parser = Arc::new(CountingParser::default());
    let session = Session::default().with_parser(parser.clone());
    (session, parser)
}

fn constant_grid_document(value: i32) -> TaskDocument {
    let mut task = empty_task("TSK1");
    task.grid = Some(dense_grid(
        "GRD1",
        GridSpec::new(6, 5, 0.0, 0.0, 1.0, 1.0),
        &create_constant_cells(6, 5, value),
    ));
    TaskDocument {
        tasks: vec![task],
        partfields: Vec::new(),
    }
}

// ============================================================================
// Memoization
// ============================================================================

#[test]
fn test_geojson_parses_once() {
    let (session, parser) = counted_session();
    session.set_active(sample_document());
    let series = SeriesRef::single("TLG00001");

    let first = session.get_geojson(&series, false).unwrap();
    let second = session.get_geojson(&series, false).unwrap();

    assert_eq!(parser.calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_derived_artifacts_share_one_parse() {
    let (session, parser) = counted_session();
    session.set_active(sample_document());
    let series = SeriesRef::single("TLG00002");

    session.get_geojson(&series, false).unwrap();
    session.get_geojson(&series, true).unwrap();
    session.get_bbox(&series).unwrap();
    session.get_range(&series, RATE_KEY, true).unwrap();
    session.get_warnings(&series).unwrap();

    assert_eq!(parser.calls(), 1);
}

#[test]
fn test_invalidate_forces_reparse() {
    let (session, parser) = counted_session();
    let old = session.set_active(sample_document());
    let series = SeriesRef::single("TLG00001");

    session.get_geojson(&series, false).unwrap();
    session.invalidate_all();
    assert!(!session.is_live(&old));

    session.set_active(sample_document());
    session.get_geojson(&series, false).unwrap();
    assert_eq!(parser.calls(), 2);
}

#[test]
fn test_merged_view_reuses_member_parses() {
    let (session, parser) = counted_session();
    session.set_active(sample_document());

    session.get_geojson(&SeriesRef::single("TLG00001"), false).unwrap();
    session.get_bbox(&SeriesRef::merged("TSK1")).unwrap();
    session.get_geojson(&SeriesRef::merged("TSK1"), false).unwrap();

    assert_eq!(parser.calls(), 2);
}

// ============================================================================
// Series queries
// ============================================================================

#[test]
fn test_invalid_position_excluded() {
    let session = Session::default();
    session.set_active(sample_document());
    let series = SeriesRef::single("TLG00001");

    assert_eq!(session.get_bbox(&series).unwrap(), Some([0.0, 0.0, 1.0, 1.0]));
    let range = session.get_range(&series, RATE_KEY, false).unwrap().unwrap();
    assert_eq!((range.min(), range.max()), (100.0, 300.0));
    assert_eq!(session.get_geojson(&series, false).unwrap().len(), 2);
}

#[test]
fn test_merged_bbox_and_features() {
    let session = Session::default();
    session.set_active(sample_document());
    let merged = SeriesRef::merged("TSK1");

    assert_eq!(session.get_bbox(&merged).unwrap(), Some([0.0, 0.0, 3.0, 3.0]));
    let range = session.get_range(&merged, RATE_KEY, false).unwrap().unwrap();
    assert_eq!((range.min(), range.max()), (100.0, 400.0));

    let features = session.get_geojson(&merged, false).unwrap();
    assert_eq!(features.len(), 5);
    assert_eq!(
        features.features[0].properties.origin.as_deref(),
        Some("TLG00001")
    );
    assert_eq!(
        features.features[4].properties.origin.as_deref(),
        Some("TLG00002")
    );
}

#[test]
fn test_merge_exclusion_is_its_own_view() {
    let session = Session::default();
    session.set_active(sample_document());
    let without_second =
        SeriesRef::Merged(MergeSpec::new("TSK1").excluding(["TLG00002"]));

    assert_eq!(
        session.get_bbox(&without_second).unwrap(),
        Some([0.0, 0.0, 1.0, 1.0])
    );
    assert_eq!(
        session.get_bbox(&SeriesRef::merged("TSK1")).unwrap(),
        Some([0.0, 0.0, 3.0, 3.0])
    );
}

#[test]
fn test_trimmed_range_within_full_range() {
    let session = Session::default();
    session.set_active(sample_document());
    let merged = SeriesRef::merged("TSK1");

    let full = session.get_range(&merged, RATE_KEY, false).unwrap().unwrap();
    let trimmed = session.get_range(&merged, RATE_KEY, true).unwrap().unwrap();
    assert!(trimmed.is_within(&full));
}

#[test]
fn test_filled_features_leave_raw_untouched() {
    let session = Session::default();
    session.set_active(sample_document());
    let series = SeriesRef::single("TLG00002");

    let raw = session.get_geojson(&series, false).unwrap();
    let filled = session.get_geojson(&series, true).unwrap();
    assert!(raw.features[1].properties.values.get(RATE_KEY).is_none());
    assert_eq!(filled.features[1].properties.values.get(RATE_KEY), Some(&300.0));
}

#[test]
fn test_field_info_and_default_key() {
    let session = Session::default();
    session.set_active(sample_document());
    let series = SeriesRef::single("TLG00001");

    assert_eq!(
        session.get_default_value_key(&series).unwrap().as_deref(),
        Some(RATE_KEY)
    );
    let info = session.get_field_info(&series, RATE_KEY).unwrap().unwrap();
    assert_eq!(info.format_value(12345.0), "123.45 l/ha");
    assert!(session.get_field_info(&series, "FFFF").unwrap().is_none());
}

#[test]
fn test_failed_series_is_isolated() {
    let session = Session::default();
    session.set_active(sample_document());
    let broken = SeriesRef::single("TLG00003");

    assert_eq!(session.get_bbox(&broken).unwrap(), None);
    assert!(session.get_geojson(&broken, false).unwrap().is_empty());
    assert!(!session.get_warnings(&broken).unwrap().is_empty());

    let merged = SeriesRef::merged("TSK2");
    assert_eq!(session.get_bbox(&merged).unwrap(), None);
    assert!(session.get_warnings(&merged).unwrap()[0].starts_with("TLG00003: "));

    // siblings still parse
    assert!(session
        .get_bbox(&SeriesRef::single("TLG00001"))
        .unwrap()
        .is_some());
}

#[test]
fn test_unknown_entity() {
    let session = Session::default();
    session.set_active(sample_document());
    assert!(matches!(
        session.get_bbox(&SeriesRef::single("TLG99")),
        Err(CacheError::NotFound { .. })
    ));
    assert!(matches!(
        session.get_grid_info("GRD9"),
        Err(CacheError::NotFound { .. })
    ));
}

// ============================================================================
// Grids
// ============================================================================

#[test]
fn test_constant_grid_renders_terminal_color() {
    let session = Session::default();
    session.set_active(constant_grid_document(42));
    let palette = Palette::default();

    let bitmap = session.get_raster_bitmap("GRD1", None, &palette).unwrap();
    assert_eq!(bitmap.opaque_colors(), vec![palette.terminal_color()]);
    assert_eq!(bitmap.pixel(1, 1), Some(palette.terminal_color()));
    assert_eq!(bitmap.pixel(0, 0), Some(Color::transparent()));
}

#[test]
fn test_pixel_value_round_trip() {
    let session = Session::default();
    session.set_active(sample_document());
    let palette = Palette::default();
    let info = session.get_grid_info("GRD1").unwrap();
    let range = info.range.unwrap();
    let bitmap = session.get_raster_bitmap("GRD1", None, &palette).unwrap();
    let scale = ColorScale::new(&palette, range);

    for py in 0..bitmap.height {
        for px in 0..bitmap.width {
            let expected = match session.get_value_at_pixel("GRD1", px, py).unwrap() {
                Some(value) => scale.color(f64::from(value)),
                None => Color::transparent(),
            };
            assert_eq!(bitmap.pixel(px, py), Some(expected), "pixel ({px}, {py})");
        }
    }

    // north row is shown first
    assert_eq!(session.get_value_at_pixel("GRD1", 0, 0).unwrap(), Some(40));
    assert_eq!(session.get_value_at_pixel("GRD1", 1, 1).unwrap(), None);
    assert_eq!(session.get_value_at_pixel("GRD1", 3, 0).unwrap(), None);
}

#[test]
fn test_coded_grid_info() {
    let session = Session::default();
    session.set_active(sample_document());

    let info = session.get_grid_info("GRD2").unwrap();
    assert_eq!((info.n_cols, info.n_rows), (2, 2));
    let bounds = info.bounds;
    assert_coords_approx_eq!((bounds.min_lon, bounds.min_lat), (10.0, 10.0), 1e-12);
    assert_coords_approx_eq!((bounds.max_lon, bounds.max_lat), (11.0, 11.0), 1e-12);
    let range = info.range.unwrap();
    assert_eq!((range.min(), range.max()), (150.0, 150.0));
    assert_eq!(session.get_value_at_pixel("GRD2", 0, 1).unwrap(), Some(150));
    assert_eq!(session.get_value_at_pixel("GRD2", 0, 0).unwrap(), None);
}

#[test]
fn test_undecodable_grid_fails_once() {
    let mut document = sample_document();
    document.tasks[0].grid.as_mut().unwrap().data.truncate(5);
    let session = Session::default();
    let cache = session.set_active(document);

    for _ in 0..2 {
        assert!(matches!(
            session.get_grid_info("GRD1"),
            Err(CacheError::Decode { ref id, .. }) if id == "GRD1"
        ));
    }
    assert!(matches!(
        session.get_raster_bitmap("GRD1", None, &Palette::default()),
        Err(CacheError::Decode { .. })
    ));
    assert!(matches!(
        session.get_value_at_pixel("GRD1", 0, 0),
        Err(CacheError::Decode { .. })
    ));

    // the failure is cached and stays local to its grid
    let grids = cache.stats().get("grids").unwrap();
    assert_eq!(grids.computations, 1);
    assert!(grids.hits >= 2);
    assert!(session.get_grid_info("GRD2").is_ok());
    assert!(session
        .get_bbox(&SeriesRef::single("TLG00001"))
        .unwrap()
        .is_some());
}

#[test]
fn test_area_geometry() {
    let session = Session::default();
    session.set_active(sample_document());
    let area = session.get_area_geometry("PFD1").unwrap();
    assert_eq!(area.bbox.unwrap().to_array(), [0.0, 0.0, 3.0, 3.0]);
}

// ============================================================================
// Document lifecycle
// ============================================================================

#[test]
fn test_failed_ingestion_state() {
    let session = Session::default();
    session.set_active(sample_document());

    let err = session
        .load_container(&JsonContainerIngestion, b"not a container")
        .unwrap_err();
    assert_eq!(session.state(), DocumentState::Failed(err.clone()));
    assert_eq!(
        session.get_bbox(&SeriesRef::single("TLG00001")),
        Err(CacheError::Ingestion(err))
    );
}

#[test]
fn test_load_container() {
    let bytes = JsonContainerIngestion
        .write_container(&sample_document())
        .unwrap();
    let session = Session::default();
    let cache = session
        .load_container(&JsonContainerIngestion, &bytes)
        .unwrap();

    assert!(session.is_live(&cache));
    assert_eq!(
        session.get_bbox(&SeriesRef::merged("TSK1")).unwrap(),
        Some([0.0, 0.0, 3.0, 3.0])
    );
}

#[test]
fn test_stats_track_population() {
    let session = Session::default();
    let cache = session.set_active(sample_document());
    let series = SeriesRef::single("TLG00001");
    session.get_geojson(&series, false).unwrap();
    session.get_geojson(&series, false).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.get("parsed").unwrap().computations, 1);
    let features = stats.get("features").unwrap();
    assert_eq!(features.computations, 1);
    assert_eq!(features.hits, 1);

    // a fresh document starts empty
    let fresh = session.set_active(sample_document());
    assert_eq!(fresh.stats().get("parsed").unwrap().entries, 0);
    assert!(fresh.generation() > stats.generation);
}
