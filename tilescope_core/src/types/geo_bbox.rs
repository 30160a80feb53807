use super::projection::{MAX_MERCATOR_LAT, MAX_MERCATOR_LNG, lonlat_to_mercator};
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// A geographic bounding box `[west, south, east, north]` in WGS84 degrees.
///
/// Every constructor validates the box: longitudes lie in `-180..=180`, latitudes in
/// `-90..=90`, and the minimum never exceeds the maximum. On the wire the box is a plain
/// four element JSON array, which is how every tilescope endpoint receives it.
///
/// # Examples
///
/// ```
/// use tilescope_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-96.81040, 32.97140, -96.81000, 32.97180).unwrap();
/// assert_eq!(bbox.as_array(), [-96.81040, 32.97140, -96.81000, 32.97180]);
///
/// let parsed: GeoBBox = serde_json::from_str("[-10, -5, 10, 5]").unwrap();
/// assert_eq!(parsed.as_tuple(), (-10.0, -5.0, 10.0, 5.0));
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 4]")]
pub struct GeoBBox {
	pub west: f64,
	pub south: f64,
	pub east: f64,
	pub north: f64,
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`.
	///
	/// # Errors
	/// Returns an error if a value is out of range or min and max are swapped.
	pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<GeoBBox> {
		GeoBBox {
			west,
			south,
			east,
			north,
		}
		.checked()
	}

	/// Builds a box from two arbitrary corners, sorting and clamping the values.
	pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<GeoBBox> {
		GeoBBox {
			west: x0.min(x1).clamp(-180.0, 180.0),
			south: y0.min(y1).clamp(-90.0, 90.0),
			east: x0.max(x1).clamp(-180.0, 180.0),
			north: y0.max(y1).clamp(-90.0, 90.0),
		}
		.checked()
	}

	/// Smallest box containing all `[lon, lat]` points, grown by `buffer` degrees on every side.
	///
	/// ```
	/// use tilescope_core::GeoBBox;
	///
	/// let points = [[-96.81020, 32.97160], [-96.81030, 32.97170]];
	/// let bbox = GeoBBox::from_points(&points, 0.001).unwrap();
	/// let [w, s, e, n] = bbox.as_array();
	/// assert!((w - -96.81130).abs() < 1e-9);
	/// assert!((s - 32.97060).abs() < 1e-9);
	/// assert!((e - -96.80920).abs() < 1e-9);
	/// assert!((n - 32.97270).abs() < 1e-9);
	/// ```
	pub fn from_points(points: &[[f64; 2]], buffer: f64) -> Result<GeoBBox> {
		ensure!(!points.is_empty(), "cannot build a bounding box from zero points");
		ensure!(buffer >= 0.0, "buffer ({buffer}) must be >= 0");

		let mut west = f64::INFINITY;
		let mut south = f64::INFINITY;
		let mut east = f64::NEG_INFINITY;
		let mut north = f64::NEG_INFINITY;
		for &[lon, lat] in points {
			ensure!(lon.is_finite() && lat.is_finite(), "point [{lon}, {lat}] is not finite");
			west = west.min(lon);
			south = south.min(lat);
			east = east.max(lon);
			north = north.max(lat);
		}

		GeoBBox::from_corners(west - buffer, south - buffer, east + buffer, north + buffer)
	}

	/// Clamps the box in place to the latitude/longitude span of Web Mercator.
	pub fn limit_to_mercator(&mut self) {
		self.west = self.west.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.south = self.south.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self.east = self.east.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.north = self.north.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.west, self.south, self.east, self.north]
	}

	#[must_use]
	pub fn as_vec(&self) -> Vec<f64> {
		self.as_array().to_vec()
	}

	#[must_use]
	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.west, self.south, self.east, self.north)
	}

	/// Returns the box as `[west,south,east,north]` without spaces.
	///
	/// ```
	/// use tilescope_core::GeoBBox;
	///
	/// let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
	/// assert_eq!(bbox.as_string_json(), "[-10,-5,10,5]");
	/// ```
	#[must_use]
	pub fn as_string_json(&self) -> String {
		format!("[{},{},{},{}]", self.west, self.south, self.east, self.north)
	}

	#[must_use]
	pub fn width(&self) -> f64 {
		self.east - self.west
	}

	#[must_use]
	pub fn height(&self) -> f64 {
		self.north - self.south
	}

	/// Grows the box in place so it also covers `other`.
	pub fn extend(&mut self, other: &GeoBBox) {
		self.west = self.west.min(other.west);
		self.south = self.south.min(other.south);
		self.east = self.east.max(other.east);
		self.north = self.north.max(other.north);
	}

	#[must_use]
	pub fn extended(mut self, other: &GeoBBox) -> GeoBBox {
		self.extend(other);
		self
	}

	/// Shrinks the box in place to the overlap with `other`.
	///
	/// The result may be inverted (west > east) when the boxes do not overlap;
	/// check with [`intersects`](Self::intersects) first.
	pub fn intersect(&mut self, other: &GeoBBox) {
		self.west = self.west.max(other.west);
		self.south = self.south.max(other.south);
		self.east = self.east.min(other.east);
		self.north = self.north.min(other.north);
	}

	#[must_use]
	pub fn intersected(mut self, other: &GeoBBox) -> GeoBBox {
		self.intersect(other);
		self
	}

	/// True if both boxes share at least one point (touching edges count).
	#[must_use]
	pub fn intersects(&self, other: &GeoBBox) -> bool {
		self.west <= other.east && other.west <= self.east && self.south <= other.north && other.south <= self.north
	}

	#[must_use]
	pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
		(self.west..=self.east).contains(&lon) && (self.south..=self.north).contains(&lat)
	}

	/// Converts the box to Web-Mercator meters `[min_x, min_y, max_x, max_y]` (EPSG:3857).
	#[must_use]
	pub fn to_mercator(&self) -> [f64; 4] {
		let [x0, y0] = lonlat_to_mercator([self.west, self.south]);
		let [x1, y1] = lonlat_to_mercator([self.east, self.north]);
		[x0, y0, x1, y1]
	}

	/// Validates the ranges and ordering of a box that was built field by field.
	pub fn checked(self) -> Result<Self> {
		ensure!(
			self.as_array().iter().all(|v| v.is_finite()),
			"bounding box {self:?} contains non-finite values"
		);
		ensure!(self.west >= -180., "west ({}) must be >= -180", self.west);
		ensure!(self.south >= -90., "south ({}) must be >= -90", self.south);
		ensure!(self.east <= 180., "east ({}) must be <= 180", self.east);
		ensure!(self.north <= 90., "north ({}) must be <= 90", self.north);
		ensure!(
			self.west <= self.east,
			"west ({}) must be <= east ({})",
			self.west,
			self.east
		);
		ensure!(
			self.south <= self.north,
			"south ({}) must be <= north ({})",
			self.south,
			self.north
		);
		Ok(self)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"GeoBBox({}, {}, {}, {})",
			self.west, self.south, self.east, self.north
		)
	}
}

impl Display for GeoBBox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}, {}, {}]", self.west, self.south, self.east, self.north)
	}
}

impl TryFrom<Vec<f64>> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: Vec<f64>) -> Result<Self> {
		ensure!(
			input.len() == 4,
			"Bounding box must contain exactly 4 coordinates, got {}",
			input.len()
		);
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}

impl From<GeoBBox> for [f64; 4] {
	fn from(bbox: GeoBBox) -> Self {
		bbox.as_array()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[test]
	fn new_and_accessors() {
		let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		assert_eq!(bbox.as_tuple(), (-10.0, -5.0, 10.0, 5.0));
		assert_eq!(bbox.as_vec(), vec![-10.0, -5.0, 10.0, 5.0]);
		assert_eq!(bbox.width(), 20.0);
		assert_eq!(bbox.height(), 10.0);
		assert_eq!(format!("{bbox:?}"), "GeoBBox(-10, -5, 10, 5)");
		assert_eq!(bbox.to_string(), "[-10, -5, 10, 5]");
	}

	#[rstest]
	#[case([-181.0, 0.0, 0.0, 1.0], "west (-181) must be >= -180")]
	#[case([0.0, -91.0, 1.0, 1.0], "south (-91) must be >= -90")]
	#[case([0.0, 0.0, 181.0, 1.0], "east (181) must be <= 180")]
	#[case([0.0, 0.0, 1.0, 91.0], "north (91) must be <= 90")]
	#[case([2.0, 0.0, 1.0, 1.0], "west (2) must be <= east (1)")]
	#[case([0.0, 2.0, 1.0, 1.0], "south (2) must be <= north (1)")]
	fn invalid_boxes(#[case] v: [f64; 4], #[case] message: &str) {
		let err = GeoBBox::try_from(v).unwrap_err();
		assert_eq!(err.to_string(), message);

		let err = GeoBBox::try_from(v.to_vec()).unwrap_err();
		assert_eq!(err.to_string(), message);
	}

	#[test]
	fn rejects_nan() {
		assert!(GeoBBox::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
	}

	#[test]
	fn from_corners_sorts_and_clamps() {
		let bbox = GeoBBox::from_corners(200.0, 10.0, -200.0, -100.0).unwrap();
		assert_eq!(bbox.as_array(), [-180.0, -90.0, 180.0, 10.0]);
	}

	#[test]
	fn from_points_with_buffer() {
		let points = [[-96.81020, 32.97160], [-96.81030, 32.97170], [-96.81010, 32.97150]];
		let bbox = GeoBBox::from_points(&points, 0.000_25).unwrap();
		let [w, s, e, n] = bbox.as_array();
		assert_abs_diff_eq!(w, -96.810_55, epsilon = 1e-9);
		assert_abs_diff_eq!(s, 32.971_25, epsilon = 1e-9);
		assert_abs_diff_eq!(e, -96.809_85, epsilon = 1e-9);
		assert_abs_diff_eq!(n, 32.971_95, epsilon = 1e-9);
	}

	#[test]
	fn from_points_single_point_without_buffer() {
		let bbox = GeoBBox::from_points(&[[8.0, 51.0]], 0.0).unwrap();
		assert_eq!(bbox.as_array(), [8.0, 51.0, 8.0, 51.0]);
	}

	#[test]
	fn from_points_rejects_empty() {
		assert!(GeoBBox::from_points(&[], 0.001).is_err());
	}

	#[test]
	fn extend_and_intersect() {
		let a = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		let b = GeoBBox::new(-8.0, -4.0, 12.0, 6.0).unwrap();
		assert_eq!(a.extended(&b).as_array(), [-10.0, -5.0, 12.0, 6.0]);
		assert_eq!(a.intersected(&b).as_array(), [-8.0, -4.0, 10.0, 5.0]);
		assert!(a.intersects(&b));

		let far = GeoBBox::new(50.0, 50.0, 60.0, 60.0).unwrap();
		assert!(!a.intersects(&far));

		let touching = GeoBBox::new(10.0, 5.0, 11.0, 6.0).unwrap();
		assert!(a.intersects(&touching));
	}

	#[test]
	fn contains_point() {
		let a = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		assert!(a.contains_point(0.0, 0.0));
		assert!(a.contains_point(10.0, 5.0));
		assert!(!a.contains_point(10.1, 0.0));
	}

	#[test]
	fn limit_to_mercator() {
		let mut bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
		bbox.limit_to_mercator();
		assert_eq!(bbox.as_array(), [-180.0, -MAX_MERCATOR_LAT, 180.0, MAX_MERCATOR_LAT]);
	}

	#[test]
	fn to_mercator_world() {
		let m = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap().to_mercator();
		for (v, e) in m.iter().zip([-20037508.342789244, -20037508.342789244, 20037508.342789244, 20037508.342789244]) {
			assert_abs_diff_eq!(*v, e, epsilon = 1e-6);
		}
	}

	#[test]
	fn serde_as_array() {
		let bbox: GeoBBox = serde_json::from_str("[-96.8104, 32.9714, -96.81, 32.9718]").unwrap();
		assert_eq!(bbox.as_array(), [-96.8104, 32.9714, -96.81, 32.9718]);
		assert_eq!(serde_json::to_string(&bbox).unwrap(), "[-96.8104,32.9714,-96.81,32.9718]");

		let err = serde_json::from_str::<GeoBBox>("[1, 2, 3]").unwrap_err();
		assert!(
			err.to_string().contains("Bounding box must contain exactly 4 coordinates"),
			"{err}"
		);
	}
}
