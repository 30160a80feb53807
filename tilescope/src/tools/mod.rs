pub mod cleanup;
pub mod download;
pub mod query;
pub mod serve;
pub mod tiles;

use anyhow::{Context, Result};
use geojson::Geometry;
use std::path::Path;
use tilescope::config::Config;
use tilescope_geometry::parse_features;

/// The configuration file if one is given, the defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
	match path {
		Some(path) => Config::from_path(path),
		None => Ok(Config::default()),
	}
}

/// All geometries of a GeoJSON file: a collection, a feature or a bare geometry.
pub fn read_geometries(path: &Path) -> Result<Vec<Geometry>> {
	let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
	let geometries: Vec<Geometry> = parse_features(&text)
		.with_context(|| format!("Failed to parse {path:?}"))?
		.into_iter()
		.filter_map(|feature| feature.geometry)
		.collect();
	log::info!("read {} geometries from {path:?}", geometries.len());
	Ok(geometries)
}
