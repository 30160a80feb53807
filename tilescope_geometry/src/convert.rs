use anyhow::{Context, Result, anyhow};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};

/// Converts a GeoJSON geometry into a `geo` geometry for spatial predicates.
pub fn to_geo(geometry: &Geometry) -> Result<geo::Geometry<f64>> {
	geo::Geometry::<f64>::try_from(geometry.clone()).map_err(|e| anyhow!("unsupported GeoJSON geometry: {e}"))
}

#[must_use]
pub fn from_geo(geometry: &geo::Geometry<f64>) -> Geometry {
	Geometry::new(geojson::Value::from(geometry))
}

#[must_use]
pub fn new_feature(geometry: Geometry, properties: JsonObject) -> Feature {
	Feature {
		bbox: None,
		geometry: Some(geometry),
		id: None,
		properties: Some(properties),
		foreign_members: None,
	}
}

#[must_use]
pub fn collection_of(features: Vec<Feature>) -> FeatureCollection {
	FeatureCollection {
		bbox: None,
		features,
		foreign_members: None,
	}
}

/// Parses a GeoJSON document that may be a collection, a single feature or a bare geometry.
pub fn parse_features(text: &str) -> Result<Vec<Feature>> {
	let geojson: GeoJson = text.parse().context("parsing GeoJSON")?;
	Ok(match geojson {
		GeoJson::FeatureCollection(fc) => fc.features,
		GeoJson::Feature(f) => vec![f],
		GeoJson::Geometry(g) => vec![new_feature(g, JsonObject::new())],
	})
}
