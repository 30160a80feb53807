use predicates::str;
use pretty_assertions::assert_eq;
use serde_json::Value;
use test_utilities::*;

#[test]
fn tiles_of_a_bbox() {
	let output = tilescope_cmd()
		.args(["tiles", "-z", "1", "--quadkeys", "-170,-80,170,80"])
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();
	let report: Value = serde_json::from_slice(&output).unwrap();
	assert_eq!(report["zoom"], 1);
	assert_eq!(report["tiles"], 4);
	assert_eq!(report["quadkeys"].as_array().unwrap().len(), 4);
}

#[test]
fn too_many_tiles() {
	tilescope_cmd()
		.args(["tiles", "-z", "19", "--max-tiles", "100", "-97,32,-96,33"])
		.assert()
		.failure()
		.stderr(str::contains("Selected area is too large for zoom level 19"));
}

#[test]
fn invalid_bbox() {
	tilescope_cmd()
		.args(["tiles", "1,2,3"])
		.assert()
		.failure()
		.stderr(str::contains("Bounding box must contain exactly 4 coordinates, got 3"));
}
