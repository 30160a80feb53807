//! Reprojection of GeoJSON between EPSG:3857 and EPSG:4326.
//!
//! Detection masks are vectorised in Web-Mercator meters; clients expect longitude and
//! latitude. After transforming, the collection is tagged with the legacy GeoJSON `crs`
//! member so that GIS clients which still read it pick the right system.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use tilescope_core::Crs;

pub fn reproject_collection(collection: &mut FeatureCollection, from: Crs, to: Crs) {
	let mut skipped = 0usize;
	for feature in &mut collection.features {
		if !reproject_feature(feature, from, to) {
			skipped += 1;
		}
	}
	if skipped > 0 {
		log::debug!("{skipped} features without geometry were left untouched");
	}
	collection.bbox = None;
	collection
		.foreign_members
		.get_or_insert_with(JsonObject::new)
		.insert("crs".to_string(), crs_member(to));
}

/// Returns `false` if the feature has no geometry.
pub fn reproject_feature(feature: &mut Feature, from: Crs, to: Crs) -> bool {
	feature.bbox = None;
	match &mut feature.geometry {
		Some(geometry) => {
			reproject_geometry(geometry, from, to);
			true
		}
		None => false,
	}
}

pub fn reproject_geometry(geometry: &mut Geometry, from: Crs, to: Crs) {
	geometry.bbox = None;
	if from != to {
		transform_value(&mut geometry.value, &|xy| from.transform(to, xy));
	}
}

/// The legacy `crs` member naming `crs` by its OGC URN.
#[must_use]
pub fn crs_member(crs: Crs) -> serde_json::Value {
	json!({"type": "name", "properties": {"name": crs.urn()}})
}

fn transform_position(position: &mut [f64], f: &dyn Fn([f64; 2]) -> [f64; 2]) {
	if let [x, y, ..] = position {
		let [nx, ny] = f([*x, *y]);
		*x = nx;
		*y = ny;
	}
}

fn transform_value(value: &mut Value, f: &dyn Fn([f64; 2]) -> [f64; 2]) {
	match value {
		Value::Point(p) => transform_position(p, f),
		Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter_mut().for_each(|p| transform_position(p, f)),
		Value::MultiLineString(ls) | Value::Polygon(ls) => ls.iter_mut().flatten().for_each(|p| transform_position(p, f)),
		Value::MultiPolygon(polys) => polys
			.iter_mut()
			.flatten()
			.flatten()
			.for_each(|p| transform_position(p, f)),
		Value::GeometryCollection(geoms) => geoms.iter_mut().for_each(|g| {
			g.bbox = None;
			transform_value(&mut g.value, f);
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use pretty_assertions::assert_eq;
	use tilescope_core::lonlat_to_mercator;

	fn mercator_square(lonlat: [f64; 2], size: f64) -> Geometry {
		let [x, y] = lonlat_to_mercator(lonlat);
		Geometry::new(Value::Polygon(vec![vec![
			vec![x, y],
			vec![x + size, y],
			vec![x + size, y + size],
			vec![x, y + size],
			vec![x, y],
		]]))
	}

	fn collection(geometries: Vec<Option<Geometry>>) -> FeatureCollection {
		FeatureCollection {
			bbox: None,
			features: geometries
				.into_iter()
				.map(|geometry| Feature {
					bbox: None,
					geometry,
					id: None,
					properties: None,
					foreign_members: None,
				})
				.collect(),
			foreign_members: None,
		}
	}

	#[test]
	fn polygon_to_wgs84() {
		let mut fc = collection(vec![Some(mercator_square([-96.8104, 32.9714], 10.0)), None]);
		reproject_collection(&mut fc, Crs::WebMercator, Crs::Wgs84);

		let Value::Polygon(rings) = &fc.features[0].geometry.as_ref().unwrap().value else {
			panic!("expected polygon");
		};
		assert_abs_diff_eq!(rings[0][0][0], -96.8104, epsilon = 1e-9);
		assert_abs_diff_eq!(rings[0][0][1], 32.9714, epsilon = 1e-9);
		assert!(rings[0][2][0] > -96.8104 && rings[0][2][0] < -96.81);
		assert!(fc.features[1].geometry.is_none());

		let crs = &fc.foreign_members.as_ref().unwrap()["crs"];
		assert_eq!(
			crs,
			&json!({"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::4326"}})
		);
	}

	#[test]
	fn multipolygon_and_collection() {
		let square = mercator_square([13.4, 52.5], 100.0);
		let Value::Polygon(rings) = square.value.clone() else { unreachable!() };
		let mut g = Geometry::new(Value::GeometryCollection(vec![
			Geometry::new(Value::MultiPolygon(vec![rings])),
			Geometry::new(Value::Point(lonlat_to_mercator([1.0, 2.0]).to_vec())),
		]));
		reproject_geometry(&mut g, Crs::WebMercator, Crs::Wgs84);

		let Value::GeometryCollection(parts) = &g.value else { unreachable!() };
		let Value::MultiPolygon(polys) = &parts[0].value else { unreachable!() };
		assert_abs_diff_eq!(polys[0][0][0][0], 13.4, epsilon = 1e-9);
		let Value::Point(p) = &parts[1].value else { unreachable!() };
		assert_abs_diff_eq!(p[0], 1.0, epsilon = 1e-9);
		assert_abs_diff_eq!(p[1], 2.0, epsilon = 1e-9);
	}

	#[test]
	fn same_crs_keeps_coordinates() {
		let mut g = Geometry::new(Value::Point(vec![5.0, 6.0]));
		reproject_geometry(&mut g, Crs::Wgs84, Crs::Wgs84);
		assert_eq!(g.value, Value::Point(vec![5.0, 6.0]));
	}
}
