use geojson::{Feature, Geometry, Value};
use tilescope_core::GeoBBox;

/// Bounding box of all positions in `geometry`, `None` if it has no positions.
#[must_use]
pub fn geometry_bounds(geometry: &Geometry) -> Option<GeoBBox> {
	let mut acc = Bounds::default();
	acc.add_value(&geometry.value);
	acc.finish()
}

/// Union of the bounds of all features that have a geometry.
#[must_use]
pub fn features_bounds(features: &[Feature]) -> Option<GeoBBox> {
	let mut acc = Bounds::default();
	for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
		acc.add_value(&geometry.value);
	}
	acc.finish()
}

#[derive(Default)]
struct Bounds {
	min: Option<[f64; 2]>,
	max: [f64; 2],
}

impl Bounds {
	fn add(&mut self, position: &[f64]) {
		let (x, y) = match position {
			[x, y, ..] => (*x, *y),
			_ => return,
		};
		match &mut self.min {
			Some(min) => {
				min[0] = min[0].min(x);
				min[1] = min[1].min(y);
				self.max[0] = self.max[0].max(x);
				self.max[1] = self.max[1].max(y);
			}
			None => {
				self.min = Some([x, y]);
				self.max = [x, y];
			}
		}
	}

	fn add_value(&mut self, value: &Value) {
		match value {
			Value::Point(p) => self.add(p),
			Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().for_each(|p| self.add(p)),
			Value::MultiLineString(ls) | Value::Polygon(ls) => ls.iter().flatten().for_each(|p| self.add(p)),
			Value::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(|p| self.add(p)),
			Value::GeometryCollection(geoms) => geoms.iter().for_each(|g| self.add_value(&g.value)),
		}
	}

	fn finish(self) -> Option<GeoBBox> {
		let min = self.min?;
		GeoBBox::from_corners(min[0], min[1], self.max[0], self.max[1]).ok()
	}
}
