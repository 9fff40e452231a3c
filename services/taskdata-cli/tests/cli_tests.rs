//! Command tests against a sample container written to a temp directory.

use std::fs;
use std::path::PathBuf;

use derived_cache::{CacheConfig, SeriesRef};
use ingestion::JsonContainerIngestion;
use renderer::Palette;
use taskdata_cli::{export_raster, geojson_string, load_session, summarize};
use tempfile::TempDir;
use taskdata_common::TaskDocument;
use test_utils::{sample_document, RATE_KEY};

fn write_sample(dir: &TempDir) -> PathBuf {
    write_document(dir, &sample_document())
}

fn write_document(dir: &TempDir, document: &TaskDocument) -> PathBuf {
    let path = dir.path().join("sample.json");
    let bytes = JsonContainerIngestion.write_container(document).unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_summary() {
    let dir = TempDir::new().unwrap();
    let session = load_session(&write_sample(&dir), CacheConfig::default()).unwrap();
    let summary = summarize(&session).unwrap();

    assert_eq!(summary.tasks.len(), 2);
    let tsk1 = &summary.tasks[0];
    assert_eq!(tsk1.merged.id, "merged:TSK1");
    assert_eq!(tsk1.merged.bbox, Some([0.0, 0.0, 3.0, 3.0]));
    assert_eq!(tsk1.merged.default_value_key.as_deref(), Some(RATE_KEY));
    assert_eq!(tsk1.series.len(), 2);
    assert_eq!(tsk1.grid.as_ref().unwrap().n_cols, 3);

    let tsk2 = &summary.tasks[1];
    assert!(!tsk2.series[0].warnings.is_empty());
    assert_eq!(tsk2.series[0].bbox, None);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["tasks"][0]["merged"]["range"]["max"], 400.0);
    assert!(json["tasks"][0].get("grid_error").is_none());
}

#[test]
fn test_summary_reports_undecodable_grid() {
    let dir = TempDir::new().unwrap();
    let mut document = sample_document();
    document.tasks[1].grid.as_mut().unwrap().data.truncate(1);
    let session = load_session(&write_document(&dir, &document), CacheConfig::default()).unwrap();

    let summary = summarize(&session).unwrap();
    assert_eq!(summary.tasks.len(), 2);

    let tsk1 = &summary.tasks[0];
    assert_eq!(tsk1.grid.as_ref().unwrap().n_cols, 3);
    assert_eq!(tsk1.grid_error, None);

    let tsk2 = &summary.tasks[1];
    assert!(tsk2.grid.is_none());
    assert!(tsk2.grid_error.as_ref().unwrap().contains("GRD2"));
    assert_eq!(tsk2.series.len(), 1);
}

#[test]
fn test_raster_export_writes_png() {
    let dir = TempDir::new().unwrap();
    let session = load_session(&write_sample(&dir), CacheConfig::default()).unwrap();
    let output = dir.path().join("grd1.png");

    let size = export_raster(&session, "GRD1", None, &Palette::default(), &output).unwrap();
    assert_eq!(size, (3, 2));

    let png = fs::read(&output).unwrap();
    assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
}

#[test]
fn test_raster_unknown_grid() {
    let dir = TempDir::new().unwrap();
    let session = load_session(&write_sample(&dir), CacheConfig::default()).unwrap();
    let output = dir.path().join("none.png");
    assert!(export_raster(&session, "GRD9", None, &Palette::default(), &output).is_err());
    assert!(!output.exists());
}

#[test]
fn test_geojson_export() {
    let dir = TempDir::new().unwrap();
    let session = load_session(&write_sample(&dir), CacheConfig::default()).unwrap();

    let json = geojson_string(&session, &SeriesRef::merged("TSK1"), false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"].as_array().unwrap().len(), 5);
}

#[test]
fn test_invalid_container_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{"version": 1, "tasks": []}"#).unwrap();

    let err = load_session(&path, CacheConfig::default()).unwrap_err();
    assert!(err.to_string().contains("container holds no tasks"));
}

#[test]
fn test_missing_container() {
    let dir = TempDir::new().unwrap();
    let err = load_session(&dir.path().join("absent.json"), CacheConfig::default()).unwrap_err();
    assert!(err.to_string().contains("failed to read container"));
}
