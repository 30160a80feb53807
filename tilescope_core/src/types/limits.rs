//! Size limits for segmentation requests.
//!
//! Segmentation only makes sense on very high resolution imagery, and every requested
//! tile is one image download, so requests are bounded by zoom range and tile count.

use super::{GeoBBox, TileBBox};
use crate::RequestError;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TileLimits {
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub max_tiles: u64,
	/// Buffer in degrees around interactive points at `min_zoom`.
	pub base_buffer: f64,
}

impl Default for TileLimits {
	fn default() -> Self {
		TileLimits {
			min_zoom: 19,
			max_zoom: 22,
			max_tiles: 2000,
			base_buffer: 0.001,
		}
	}
}

impl TileLimits {
	pub fn check_zoom(&self, zoom: u8) -> Result<(), RequestError> {
		if (self.min_zoom..=self.max_zoom).contains(&zoom) {
			Ok(())
		} else {
			Err(RequestError::validation(format!(
				"Zoom level must be between {} and {}",
				self.min_zoom, self.max_zoom
			)))
		}
	}

	/// Rejects boxes that would need more than `max_tiles` tiles at `zoom`.
	pub fn check_area(&self, bbox: &GeoBBox, zoom: u8) -> Result<u64, RequestError> {
		let requested_tiles = TileBBox::count_covering(bbox, zoom);
		log::debug!("{bbox} at zoom {zoom} covers {requested_tiles} tiles");
		if requested_tiles > self.max_tiles {
			return Err(RequestError::AreaTooLarge {
				zoom,
				requested_tiles,
				max_tiles: self.max_tiles,
			});
		}
		Ok(requested_tiles)
	}

	/// Buffer around interactive points, halved with every zoom level above `min_zoom`.
	#[must_use]
	pub fn buffer_for_zoom(&self, zoom: u8) -> f64 {
		let steps = i32::from(zoom) - i32::from(self.min_zoom);
		self.base_buffer / 2f64.powi(steps)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use rstest::rstest;

	#[rstest]
	#[case(18, false)]
	#[case(19, true)]
	#[case(22, true)]
	#[case(23, false)]
	fn zoom_range(#[case] zoom: u8, #[case] ok: bool) {
		let result = TileLimits::default().check_zoom(zoom);
		assert_eq!(result.is_ok(), ok);
		if let Err(err) = result {
			assert_eq!(err.to_string(), "Zoom level must be between 19 and 22");
		}
	}

	#[test]
	fn area_within_limit() {
		let bbox = GeoBBox::new(-96.82, 32.96, -96.80, 32.98).unwrap();
		assert_eq!(TileLimits::default().check_area(&bbox, 19).unwrap(), 1080);
	}

	#[test]
	fn area_too_large() {
		let bbox = GeoBBox::new(-96.82, 32.96, -96.80, 32.98).unwrap();
		let err = TileLimits::default().check_area(&bbox, 20).unwrap_err();
		assert_eq!(
			err,
			RequestError::AreaTooLarge {
				zoom: 20,
				requested_tiles: 4130,
				max_tiles: 2000
			}
		);
		assert_eq!(err.to_string(), "Selected area is too large for zoom level 20");
	}

	#[test]
	fn non_finite_area_is_rejected() {
		let bbox = GeoBBox {
			west: f64::NAN,
			..GeoBBox::new(-96.82, 32.96, -96.80, 32.98).unwrap()
		};
		assert!(matches!(
			TileLimits::default().check_area(&bbox, 19),
			Err(RequestError::AreaTooLarge { requested_tiles: u64::MAX, .. })
		));
	}

	#[rstest]
	#[case(19, 0.001)]
	#[case(20, 0.0005)]
	#[case(22, 0.000125)]
	fn buffer_halves_per_level(#[case] zoom: u8, #[case] expected: f64) {
		assert_abs_diff_eq!(TileLimits::default().buffer_for_zoom(zoom), expected, epsilon = 1e-15);
	}

	#[test]
	fn deserialize_partial() {
		let limits: TileLimits = serde_json::from_str(r#"{"max_tiles": 50}"#).unwrap();
		assert_eq!(limits.max_tiles, 50);
		assert_eq!(limits.min_zoom, 19);
		assert!(serde_json::from_str::<TileLimits>(r#"{"tiles": 50}"#).is_err());
	}
}
