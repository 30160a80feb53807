use anyhow::{Context, Result, ensure};
use image::{ImageFormat, RgbImage, imageops};
use std::io::Cursor;
use tilescope_core::{Crs, GeoBBox, lonlat_to_mercator, mercator_to_lonlat};
use tilescope_geometry::PixelGrid;

/// Tolerance in pixels when snapping a bounding box to the pixel grid.
const EPSILON: f64 = 1e-6;

/// An RGB image with a Web-Mercator extent. Pixel (0, 0) is the north-west corner.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoRaster {
	pub image: RgbImage,
	/// `[min_x, min_y, max_x, max_y]` in meters.
	pub extent: [f64; 4],
}

impl GeoRaster {
	pub fn new(image: RgbImage, extent: [f64; 4]) -> Result<GeoRaster> {
		ensure!(image.width() > 0 && image.height() > 0, "raster must not be empty");
		ensure!(
			extent[0] < extent[2] && extent[1] < extent[3],
			"invalid raster extent {extent:?}"
		);
		Ok(GeoRaster { image, extent })
	}

	#[must_use]
	pub fn width(&self) -> u32 {
		self.image.width()
	}

	#[must_use]
	pub fn height(&self) -> u32 {
		self.image.height()
	}

	#[must_use]
	pub fn pixel_grid(&self) -> PixelGrid {
		let [min_x, min_y, max_x, max_y] = self.extent;
		PixelGrid {
			origin: [min_x, max_y],
			pixel_size: [
				(max_x - min_x) / f64::from(self.width()),
				-(max_y - min_y) / f64::from(self.height()),
			],
			crs: Crs::WebMercator,
		}
	}

	/// Fractional pixel position of a WGS84 point, used to hand point prompts to the model.
	#[must_use]
	pub fn lonlat_to_pixel(&self, lonlat: [f64; 2]) -> [f64; 2] {
		self.pixel_grid().to_pixel(lonlat_to_mercator(lonlat))
	}

	/// WGS84 extent of the raster.
	pub fn geo_bbox(&self) -> Result<GeoBBox> {
		let [x0, y0] = mercator_to_lonlat([self.extent[0], self.extent[1]]);
		let [x1, y1] = mercator_to_lonlat([self.extent[2], self.extent[3]]);
		GeoBBox::from_corners(x0, y0, x1, y1)
	}

	/// Cuts out the pixels covering `bbox`, rounding outwards to whole pixels.
	pub fn crop_to(&self, bbox: &GeoBBox) -> Result<GeoRaster> {
		let [nw_col, nw_row] = self.lonlat_to_pixel([bbox.west, bbox.north]);
		let [se_col, se_row] = self.lonlat_to_pixel([bbox.east, bbox.south]);

		let clamp = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
		let x0 = clamp((nw_col + EPSILON).floor(), self.width());
		let y0 = clamp((nw_row + EPSILON).floor(), self.height());
		let x1 = clamp((se_col - EPSILON).ceil(), self.width()).max(x0 + 1).min(self.width());
		let y1 = clamp((se_row - EPSILON).ceil(), self.height()).max(y0 + 1).min(self.height());
		ensure!(
			x0 < x1 && y0 < y1,
			"bounding box {bbox} does not overlap the raster"
		);

		let grid = self.pixel_grid();
		let [min_x, max_y] = grid.to_map(f64::from(x0), f64::from(y0));
		let [max_x, min_y] = grid.to_map(f64::from(x1), f64::from(y1));
		let image = imageops::crop_imm(&self.image, x0, y0, x1 - x0, y1 - y0).to_image();

		log::trace!(
			"cropped {}x{} raster to {}x{} at ({x0}, {y0})",
			self.width(),
			self.height(),
			image.width(),
			image.height()
		);
		GeoRaster::new(image, [min_x, min_y, max_x, max_y])
	}

	pub fn encode_png(&self) -> Result<Vec<u8>> {
		let mut buffer = Cursor::new(Vec::new());
		self
			.image
			.write_to(&mut buffer, ImageFormat::Png)
			.context("encoding raster as PNG")?;
		Ok(buffer.into_inner())
	}
}
