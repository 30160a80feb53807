use assert_fs::{TempDir, prelude::*};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use test_utilities::*;

/// Quadkey of the level 9 tile around Berlin's center (13.4°E, 52.5°N).
const BERLIN_QUADKEY: &str = "120210233";

#[test]
fn query_cached_buildings() {
	let dir = TempDir::new().unwrap();
	let config = write_config(dir.path(), "");
	dir.child(format!("data/cache/{BERLIN_QUADKEY}_processed.json"))
		.write_str(
			&json!({"type": "FeatureCollection", "features": [
				building(13.4000, 52.5000, 0.001),
				building(13.4100, 52.5100, 0.001),
			]})
			.to_string(),
		)
		.unwrap();

	let area = dir.child("area.geojson");
	area
		.write_str(
			&json!({"type": "Polygon", "coordinates": [[
				[13.3995, 52.4995], [13.4015, 52.4995], [13.4015, 52.5015], [13.3995, 52.5015], [13.3995, 52.4995]
			]]})
			.to_string(),
		)
		.unwrap();

	let output = dir.child("buildings.geojson");
	tilescope_cmd()
		.args(["query", "-c", config.to_str().unwrap(), "-o", output.path().to_str().unwrap()])
		.arg(area.path())
		.assert()
		.success();

	let result: Value = serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap()).unwrap();
	assert_eq!(result["type"], "FeatureCollection");
	assert_eq!(result["features"].as_array().unwrap().len(), 1);
	assert_eq!(result["features"][0]["properties"]["height"], 8.5);
}

#[test]
fn invalid_geojson() {
	let dir = TempDir::new().unwrap();
	let area = dir.child("area.geojson");
	area.write_str("{\"type\": \"Nothing\"}").unwrap();

	tilescope_cmd()
		.args(["query", "-d", dir.path().to_str().unwrap()])
		.arg(area.path())
		.assert()
		.failure()
		.stderr(predicates::str::contains("Failed to parse"));
}
