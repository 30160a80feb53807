//! Rectangular ranges of tiles at a single zoom level.
//!
//! Coordinates are inclusive on both ends: `x_min..=x_max`, `y_min..=y_max`.
//!
//! ```
//! use tilescope_core::{GeoBBox, TileBBox};
//!
//! let bbox = GeoBBox::new(8.0653, 51.3563, 12.3528, 52.2564).unwrap();
//! let tiles = TileBBox::from_geo(9, &bbox).unwrap();
//! assert_eq!(tiles.count(), 21);
//! ```

use super::{GeoBBox, QuadKey, TileCoord};
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::fmt;

#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct TileBBox {
	pub level: u8,
	pub x_min: u32,
	pub y_min: u32,
	pub x_max: u32,
	pub y_max: u32,
}

impl TileBBox {
	pub fn from_min_and_max(level: u8, x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Result<TileBBox> {
		ensure!(level <= 31, "level ({level}) must be <= 31");

		let max = (1u64 << level) - 1;

		ensure!(x_min <= x_max, "x_min ({x_min}) must be <= x_max ({x_max})");
		ensure!(y_min <= y_max, "y_min ({y_min}) must be <= y_max ({y_max})");
		ensure!(u64::from(x_max) <= max, "x_max ({x_max}) must be <= {max}");
		ensure!(u64::from(y_max) <= max, "y_max ({y_max}) must be <= {max}");

		Ok(TileBBox {
			level,
			x_min,
			y_min,
			x_max,
			y_max,
		})
	}

	/// All tiles at `level` touched by `bbox`.
	///
	/// Edges lying exactly on a tile boundary do not pull in the neighbouring tile.
	pub fn from_geo(level: u8, bbox: &GeoBBox) -> Result<TileBBox> {
		let bbox = bbox.checked()?;

		let west = (bbox.west + 1e-10).min(bbox.east);
		let north = (bbox.north - 1e-10).max(bbox.south);
		let east = (bbox.east - 1e-10).max(bbox.west);
		let south = (bbox.south + 1e-10).min(bbox.north);

		let nw = TileCoord::from_geo(west, north, level)?;
		let se = TileCoord::from_geo(east, south, level)?;

		TileBBox::from_min_and_max(level, nw.x, nw.y, se.x.max(nw.x), se.y.max(nw.y))
	}

	/// Number of tiles a request for `bbox` at `level` is charged for.
	///
	/// Takes the fractional tile positions of the south-west and north-east corners and
	/// counts every row and column they reach into. A box whose edge falls exactly on a tile
	/// boundary is not charged for the neighbour. Latitudes beyond the Mercator limit count
	/// as the outermost row, and a box with non-finite coordinates counts as `u64::MAX`.
	#[must_use]
	pub fn count_covering(bbox: &GeoBBox, level: u8) -> u64 {
		if !bbox.as_array().iter().all(|v| v.is_finite()) {
			return u64::MAX;
		}

		let n = 2f64.powi(i32::from(level));
		let corner = |lon: f64, lat: f64| {
			let lat = lat.clamp(-super::MAX_MERCATOR_LAT, super::MAX_MERCATOR_LAT);
			TileCoord::geo_to_fractional(lon, lat, level).map(|v| v.clamp(0.0, n))
		};
		let [ax, ay] = corner(bbox.west, bbox.south);
		let [bx, by] = corner(bbox.east, bbox.north);

		let (x0, x1) = (ax.min(bx), ax.max(bx));
		let (y0, y1) = (ay.min(by), ay.max(by));

		let cols = (x1.ceil() - x0.floor()).max(1.0);
		let rows = (y1.ceil() - y0.floor()).max(1.0);
		(cols * rows) as u64
	}

	#[must_use]
	pub fn width(&self) -> u32 {
		self.x_max - self.x_min + 1
	}

	#[must_use]
	pub fn height(&self) -> u32 {
		self.y_max - self.y_min + 1
	}

	#[must_use]
	pub fn count(&self) -> u64 {
		u64::from(self.width()) * u64::from(self.height())
	}

	#[must_use]
	pub fn contains(&self, coord: &TileCoord) -> bool {
		coord.level == self.level
			&& (self.x_min..=self.x_max).contains(&coord.x)
			&& (self.y_min..=self.y_max).contains(&coord.y)
	}

	/// Iterates over all tiles in row-major order.
	pub fn iter_coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
		(self.y_min..=self.y_max)
			.cartesian_product(self.x_min..=self.x_max)
			.map(|(y, x)| TileCoord { level: self.level, x, y })
	}

	pub fn quadkeys(&self) -> impl Iterator<Item = QuadKey> + '_ {
		self.iter_coords().map(|coord| coord.quadkey())
	}

	/// Geographic extent covered by all tiles, which is usually larger than the box
	/// the tiles were computed from.
	#[must_use]
	pub fn to_geo_bbox(&self) -> GeoBBox {
		let [west, north] = TileCoord::coord_to_geo(self.level, self.x_min, self.y_min);
		let [east, south] = TileCoord::coord_to_geo(self.level, self.x_max + 1, self.y_max + 1);
		GeoBBox {
			west,
			south,
			east,
			north,
		}
	}
}

impl fmt::Debug for TileBBox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:[{},{},{},{}] ({})",
			self.level,
			self.x_min,
			self.y_min,
			self.x_max,
			self.y_max,
			self.count()
		)
	}
}
