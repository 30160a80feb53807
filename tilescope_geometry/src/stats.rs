use crate::features_bounds;
use geojson::{Feature, FeatureCollection};
use serde::Serialize;

/// Summary of a building footprint collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuildingStats {
	pub total_buildings: usize,
	/// Buildings with a non-null `height` property.
	pub has_height: usize,
	/// Buildings with a non-null `name` or `names` property.
	pub has_name: usize,
	/// `[west, south, east, north]` of all footprints, empty if there are none.
	pub bbox: Vec<f64>,
}

impl BuildingStats {
	#[must_use]
	pub fn from_collection(collection: &FeatureCollection) -> BuildingStats {
		let features = &collection.features;
		BuildingStats {
			total_buildings: features.len(),
			has_height: features.iter().filter(|f| has_property(f, "height")).count(),
			has_name: features
				.iter()
				.filter(|f| has_property(f, "name") || has_property(f, "names"))
				.count(),
			bbox: features_bounds(features).map(|b| b.as_vec()).unwrap_or_default(),
		}
	}
}

fn has_property(feature: &Feature, key: &str) -> bool {
	feature
		.properties
		.as_ref()
		.and_then(|p| p.get(key))
		.is_some_and(|v| !v.is_null())
}
