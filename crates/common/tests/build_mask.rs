use std::fs;
use std::path::{Path, PathBuf};

use berlin_pixels_common::{build_mask, Config, MaskError};
use serde_json::{json, Value};

const SQUARE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "PROG": "0101" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[0, 0], [1000, 0], [1000, 1000], [0, 1000], [0, 0]]]
      }
    }
  ]
}"#;

fn config(input: &Path, output: &Path, cell_size: f64) -> Config {
    Config {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        cell_size,
        ..Config::default()
    }
}

fn write_input(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("boundary.geojson");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn writes_square_mask_into_new_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), SQUARE);
    let output = dir.path().join("public/masks/berlin_pixels.geojson");

    let mask = build_mask(&config(&input, &output, 500.0)).unwrap();
    assert_eq!(mask.scanned, 4);
    assert_eq!(mask.cells.len(), 4);

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let ids: Vec<&str> = written["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["bpx_1", "bpx_2", "bpx_3", "bpx_4"]);
    assert_eq!(
        written["features"][2]["geometry"]["coordinates"],
        json!([[[500.0, 0.0], [1000.0, 0.0], [1000.0, 500.0], [500.0, 500.0], [500.0, 0.0]]])
    );

    // Only the mask itself is left behind, no temporary files.
    let entries: Vec<_> = fs::read_dir(output.parent().unwrap()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), SQUARE);
    let first = dir.path().join("first.geojson");
    let second = dir.path().join("second.geojson");

    build_mask(&config(&input, &first, 125.0)).unwrap();
    build_mask(&config(&input, &second, 125.0)).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn rerun_overwrites_previous_mask() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), SQUARE);
    let output = dir.path().join("mask.geojson");

    build_mask(&config(&input, &output, 250.0)).unwrap();
    build_mask(&config(&input, &output, 500.0)).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["features"].as_array().unwrap().len(), 4);
}

#[test]
fn failed_run_leaves_previous_mask_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), SQUARE);
    let output = dir.path().join("mask.geojson");
    build_mask(&config(&input, &output, 500.0)).unwrap();
    let before = fs::read(&output).unwrap();

    let broken = dir.path().join("broken.geojson");
    fs::write(&broken, r#"{"type":"FeatureCollection","features":[{"#).unwrap();
    let err = build_mask(&config(&broken, &output, 500.0)).unwrap_err();
    assert!(matches!(err, MaskError::InvalidInput(_)), "{err}");

    let err = build_mask(&config(&input, &output, 0.0)).unwrap_err();
    assert!(matches!(err, MaskError::InvalidConfig(_)), "{err}");

    assert_eq!(fs::read(&output).unwrap(), before);
}

#[test]
fn empty_feature_collection_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), r#"{"type":"FeatureCollection","features":[]}"#);
    let output = dir.path().join("mask.geojson");

    let err = build_mask(&config(&input, &output, 500.0)).unwrap_err();
    assert!(matches!(err, MaskError::InvalidInput(_)), "{err}");
    assert!(!output.exists());
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("mask.geojson");

    let err = build_mask(&config(&dir.path().join("nope.geojson"), &output, 500.0)).unwrap_err();
    assert!(matches!(err, MaskError::Io { .. }), "{err}");
    assert!(!output.exists());
}

#[test]
fn unwritable_output_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), SQUARE);
    // A regular file where the output directory should be.
    let blocker = dir.path().join("masks");
    fs::write(&blocker, "").unwrap();

    let err = build_mask(&config(&input, &blocker.join("mask.geojson"), 500.0)).unwrap_err();
    assert!(matches!(err, MaskError::Io { .. }), "{err}");
}
