use crate::{BuildingCache, quadkeys_for};
use anyhow::{Context, Result};
use geojson::{FeatureCollection, Geometry, Value};
use serde::Serialize;
use tilescope_core::{GeoBBox, RequestError};
use tilescope_geometry::{BuildingStats, collection_of, filter_intersecting, to_geo};

/// Footprints of a bounding box together with their statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildingReport {
	pub geojson: FeatureCollection,
	pub stats: BuildingStats,
}

/// Answers spatial queries from the downloaded tiles in a [`BuildingCache`].
#[derive(Clone, Debug)]
pub struct BuildingQuery {
	cache: BuildingCache,
	level: u8,
}

impl BuildingQuery {
	#[must_use]
	pub fn new(cache: BuildingCache, level: u8) -> BuildingQuery {
		BuildingQuery { cache, level }
	}

	/// All cached buildings intersecting any of `geometries`.
	///
	/// A building touching two geometries is returned twice. Tiles that were never downloaded
	/// contribute nothing, so the result is an empty collection rather than an error.
	pub fn query(&self, geometries: &[Geometry]) -> Result<FeatureCollection> {
		let mut buildings = Vec::new();

		for geometry in geometries {
			let area = to_geo(geometry)?;
			let quad_keys = quadkeys_for(std::slice::from_ref(geometry), self.level)?;
			log::debug!("querying quadkeys {quad_keys:?}");

			for quad_key in &quad_keys {
				let Some(tile) = self.cache.read(quad_key)? else {
					log::debug!("quadkey {quad_key} is not cached");
					continue;
				};
				buildings.extend(filter_intersecting(tile.features, &area));
			}
		}

		log::info!("found {} buildings for {} geometries", buildings.len(), geometries.len());
		Ok(collection_of(buildings))
	}

	/// Buildings intersecting `bbox` with their statistics.
	///
	/// Fails with [`RequestError::NotFound`] if there are none.
	pub fn report(&self, bbox: &GeoBBox) -> Result<BuildingReport> {
		let geojson = self
			.query(&[bbox_polygon(bbox)])
			.with_context(|| format!("querying buildings in {bbox}"))?;
		if geojson.features.is_empty() {
			return Err(RequestError::not_found("No building data found for the given bbox").into());
		}

		let stats = BuildingStats::from_collection(&geojson);
		Ok(BuildingReport { geojson, stats })
	}
}

/// The outline of `bbox` as a GeoJSON polygon.
pub fn bbox_polygon(bbox: &GeoBBox) -> Geometry {
	let [w, s, e, n] = bbox.as_array();
	Geometry::new(Value::Polygon(vec![vec![
		vec![w, s],
		vec![e, s],
		vec![e, n],
		vec![w, n],
		vec![w, s],
	]]))
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::TempDir;
	use pretty_assertions::assert_eq;

	fn feature_collection(json: &str) -> FeatureCollection {
		json.parse().unwrap()
	}

	fn setup() -> (TempDir, BuildingQuery) {
		let tmp = TempDir::new().unwrap();
		let cache = BuildingCache::open(tmp.path(), "cache").unwrap();
		cache
			.write(
				&"120210233".parse().unwrap(),
				&feature_collection(
					r#"{"type":"FeatureCollection","features":[
						{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[13.400,52.520],[13.401,52.520],[13.401,52.521],[13.400,52.520]]]},"properties":{"height":10.5}},
						{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[13.500,52.550],[13.501,52.550],[13.501,52.551],[13.500,52.550]]]},"properties":{"name":"Depot"}}
					]}"#,
				),
			)
			.unwrap();
		(tmp, BuildingQuery::new(cache, 9))
	}

	#[test]
	fn query_filters_by_geometry() {
		let (_tmp, query) = setup();
		let area: Geometry = r#"{"type":"Polygon","coordinates":[[[13.39,52.51],[13.41,52.51],[13.41,52.53],[13.39,52.53],[13.39,52.51]]]}"#
			.parse()
			.unwrap();
		let result = query.query(&[area]).unwrap();
		assert_eq!(result.features.len(), 1);
		assert_eq!(result.features[0].properties.as_ref().unwrap()["height"], 10.5);
	}

	#[test]
	fn query_of_uncached_area_is_empty() {
		let (_tmp, query) = setup();
		let area: Geometry = r#"{"type":"Point","coordinates":[-96.81,32.97]}"#.parse().unwrap();
		let result = query.query(&[area]).unwrap();
		assert!(result.features.is_empty());
		assert_eq!(
			serde_json::to_value(&result).unwrap(),
			serde_json::json!({"type": "FeatureCollection", "features": []})
		);
	}

	#[test]
	fn report_with_stats() {
		let (_tmp, query) = setup();
		let report = query.report(&GeoBBox::new(13.3, 52.5, 13.6, 52.6).unwrap()).unwrap();
		assert_eq!(report.stats.total_buildings, 2);
		assert_eq!(report.stats.has_height, 1);
		assert_eq!(report.stats.has_name, 1);
		assert_eq!(report.stats.bbox, vec![13.4, 52.52, 13.501, 52.551]);
	}

	#[test]
	fn empty_report_is_not_found() {
		let (_tmp, query) = setup();
		let err = query.report(&GeoBBox::new(-96.82, 32.96, -96.80, 32.98).unwrap()).unwrap_err();
		assert_eq!(
			RequestError::find(&err),
			Some(&RequestError::NotFound("No building data found for the given bbox".into()))
		);
	}
}
