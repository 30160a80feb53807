//! Spherical Web-Mercator projection and the two coordinate reference systems tilescope speaks.
//!
//! Imagery and detection masks live in EPSG:3857 (meters), requests and responses in
//! EPSG:4326 (degrees, longitude first).

use anyhow::{Result, bail};
use std::{f64::consts::PI, fmt};

/// Latitude limit of the Web-Mercator square.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
/// Longitude limit.
pub const MAX_MERCATOR_LNG: f64 = 180.0;
/// WGS84 semi-major axis in meters, used as sphere radius.
pub const EARTH_RADIUS: f64 = 6_378_137.0;
/// Half the width of the Web-Mercator square in meters.
pub const MERCATOR_HALF_SIZE: f64 = PI * EARTH_RADIUS;

/// Projects `[lon, lat]` in degrees to Web-Mercator `[x, y]` in meters.
///
/// Latitudes beyond ±85.0511° are clamped so the result stays finite.
#[must_use]
pub fn lonlat_to_mercator(lonlat: [f64; 2]) -> [f64; 2] {
	let lon = lonlat[0].clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
	let lat = lonlat[1].clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	[
		EARTH_RADIUS * lon.to_radians(),
		EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln(),
	]
}

/// Inverse of [`lonlat_to_mercator`].
#[must_use]
pub fn mercator_to_lonlat(xy: [f64; 2]) -> [f64; 2] {
	[
		(xy[0] / EARTH_RADIUS).to_degrees(),
		(2.0 * (xy[1] / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
	]
}

/// A coordinate reference system known to tilescope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Crs {
	/// EPSG:4326, degrees.
	Wgs84,
	/// EPSG:3857, meters.
	WebMercator,
}

impl Crs {
	#[must_use]
	pub fn epsg(&self) -> u32 {
		match self {
			Crs::Wgs84 => 4326,
			Crs::WebMercator => 3857,
		}
	}

	pub fn from_epsg(code: u32) -> Result<Crs> {
		Ok(match code {
			4326 => Crs::Wgs84,
			3857 | 900_913 => Crs::WebMercator,
			other => bail!("unsupported CRS EPSG:{other}, expected 4326 or 3857"),
		})
	}

	/// OGC URN as written into the legacy GeoJSON `crs` member.
	#[must_use]
	pub fn urn(&self) -> String {
		format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
	}

	/// Transforms one `[x, y]` position from `self` into `target`.
	#[must_use]
	pub fn transform(&self, target: Crs, xy: [f64; 2]) -> [f64; 2] {
		match (self, target) {
			(Crs::WebMercator, Crs::Wgs84) => mercator_to_lonlat(xy),
			(Crs::Wgs84, Crs::WebMercator) => lonlat_to_mercator(xy),
			_ => xy,
		}
	}
}

impl fmt::Display for Crs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EPSG:{}", self.epsg())
	}
}
