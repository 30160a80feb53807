//! Tile coordinates in the Web-Mercator (XYZ / slippy map) pyramid.
//!
//! ```
//! use tilescope_core::TileCoord;
//!
//! // Berlin at zoom 10
//! let coord = TileCoord::from_geo(13.404954, 52.520008, 10).unwrap();
//! assert_eq!((coord.level, coord.x, coord.y), (10, 550, 335));
//! assert_eq!(coord.quadkey().to_string(), "1202102332");
//! ```

use super::{GeoBBox, QuadKey};
use anyhow::{Result, ensure};
use std::{
	f64::consts::PI,
	fmt::{self, Debug, Display},
};

/// A tile at zoom `level` with column `x` and row `y`; row 0 is the northern edge.
#[derive(Eq, PartialEq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// # Errors
	/// Returns an error if `level > 31` or `x`/`y` are outside `0..2^level`.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= 31, "level ({level}) must be <= 31");
		let max = 1u64 << level;
		ensure!(u64::from(x) < max, "x ({x}) out of bounds for level {level}");
		ensure!(u64::from(y) < max, "y ({y}) out of bounds for level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Fractional tile position of a WGS84 point, not floored.
	///
	/// The integer part is the tile, the fraction is the position inside it.
	/// Latitude is not clamped, so the poles yield infinities.
	#[must_use]
	pub fn geo_to_fractional(lon: f64, lat: f64, level: u8) -> [f64; 2] {
		let n = 2f64.powi(i32::from(level));
		let lat_r = lat.to_radians();
		[
			(lon + 180.0) / 360.0 * n,
			(1.0 - (lat_r.tan() + 1.0 / lat_r.cos()).ln() / PI) / 2.0 * n,
		]
	}

	/// Returns the tile containing `lon`/`lat` at zoom `level`.
	///
	/// Points on the antimeridian or beyond the Mercator latitude limit snap to the
	/// outermost tile.
	pub fn from_geo(lon: f64, lat: f64, level: u8) -> Result<TileCoord> {
		ensure!(level <= 31, "level ({level}) must be <= 31");
		ensure!((-180.0..=180.0).contains(&lon), "longitude ({lon}) must be within -180..180");
		ensure!((-90.0..=90.0).contains(&lat), "latitude ({lat}) must be within -90..90");

		let max = 2f64.powi(i32::from(level)) - 1.0;
		let lat = lat.clamp(-super::MAX_MERCATOR_LAT, super::MAX_MERCATOR_LAT);
		let [x, y] = Self::geo_to_fractional(lon, lat, level);
		let clamp = |v: f64| v.floor().clamp(0.0, max);

		TileCoord::new(level, clamp(x) as u32, clamp(y) as u32)
	}

	/// North-west corner of tile (`x`, `y`) at `level` as `[lon, lat]`.
	///
	/// `x` and `y` may equal `2^level` to address the south/east edge of the grid.
	#[must_use]
	pub fn coord_to_geo(level: u8, x: u32, y: u32) -> [f64; 2] {
		let n = 2f64.powi(i32::from(level));
		[
			f64::from(x) / n * 360.0 - 180.0,
			(PI * (1.0 - 2.0 * f64::from(y) / n)).sinh().atan().to_degrees(),
		]
	}

	#[must_use]
	pub fn as_geo(&self) -> [f64; 2] {
		TileCoord::coord_to_geo(self.level, self.x, self.y)
	}

	/// Geographic extent of this tile.
	#[must_use]
	pub fn to_geo_bbox(&self) -> GeoBBox {
		let [west, north] = self.as_geo();
		let [east, south] = TileCoord::coord_to_geo(self.level, self.x + 1, self.y + 1);
		GeoBBox {
			west,
			south,
			east,
			north,
		}
	}

	/// Web-Mercator extent `[min_x, min_y, max_x, max_y]` of this tile in meters.
	#[must_use]
	pub fn to_mercator_bbox(&self) -> [f64; 4] {
		let size = 2.0 * super::MERCATOR_HALF_SIZE / 2f64.powi(i32::from(self.level));
		let min_x = -super::MERCATOR_HALF_SIZE + f64::from(self.x) * size;
		let max_y = super::MERCATOR_HALF_SIZE - f64::from(self.y) * size;
		[min_x, max_y - size, min_x + size, max_y]
	}

	#[must_use]
	pub fn quadkey(&self) -> QuadKey {
		QuadKey::from_coord(self)
	}

	/// The tile one level up that contains this tile. Level 0 is its own parent.
	#[must_use]
	pub fn parent(&self) -> TileCoord {
		if self.level == 0 {
			return *self;
		}
		TileCoord {
			level: self.level - 1,
			x: self.x / 2,
			y: self.y / 2,
		}
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, [{}, {}])", self.level, self.x, self.y)
	}
}

impl Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.level, self.x, self.y)
	}
}
