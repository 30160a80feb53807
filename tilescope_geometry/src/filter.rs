use crate::to_geo;
use geo::Intersects;
use geojson::Feature;

/// Keeps the features whose geometry intersects `area`.
///
/// Features without geometry, or with geometry that cannot be converted, are dropped.
pub fn filter_intersecting(features: impl IntoIterator<Item = Feature>, area: &geo::Geometry<f64>) -> Vec<Feature> {
	features
		.into_iter()
		.filter(|feature| {
			feature
				.geometry
				.as_ref()
				.and_then(|g| to_geo(g).ok())
				.is_some_and(|g| g.intersects(area))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use geo::{Rect, coord};
	use geojson::{Geometry, Value};
	use pretty_assertions::assert_eq;

	fn point_feature(x: f64, y: f64) -> Feature {
		crate::new_feature(Geometry::new(Value::Point(vec![x, y])), geojson::JsonObject::new())
	}

	#[test]
	fn keeps_only_intersecting() {
		let area = geo::Geometry::Rect(Rect::new(coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 10.0}));
		let mut no_geometry = point_feature(0.0, 0.0);
		no_geometry.geometry = None;

		let kept = filter_intersecting(
			vec![point_feature(5.0, 5.0), point_feature(15.0, 5.0), point_feature(10.0, 10.0), no_geometry],
			&area,
		);
		assert_eq!(kept.len(), 2);
		assert_eq!(kept[0], point_feature(5.0, 5.0));
	}
}
