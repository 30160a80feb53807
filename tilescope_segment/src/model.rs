use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use image::{GrayImage, RgbImage};
use std::fmt::Debug;

/// What to look for in a text-prompted segmentation.
#[derive(Clone, Debug, PartialEq)]
pub struct TextPrompt {
	pub text: String,
	pub box_threshold: f64,
	pub text_threshold: f64,
}

/// Prompt points in pixel coordinates of the image handed to the model.
#[derive(Clone, Debug, PartialEq)]
pub struct PointPrompt {
	pub points: Vec<[f64; 2]>,
	/// `1` marks a point on the object, `-1` a point outside of it.
	pub labels: Vec<i8>,
	pub box_threshold: f64,
}

/// A segmentation model. Both methods return a mask of the same size as `image` in which
/// every non-zero pixel belongs to a detected object.
#[async_trait]
pub trait SegmentationModel: Debug + Send + Sync {
	/// Name used in logs.
	fn name(&self) -> String;

	async fn segment_text(&self, image: &RgbImage, prompt: &TextPrompt) -> Result<GrayImage>;

	async fn segment_points(&self, image: &RgbImage, prompt: &PointPrompt) -> Result<GrayImage>;
}

/// Decodes an encoded mask image into one luma channel.
pub fn decode_mask(bytes: &[u8]) -> Result<GrayImage> {
	let image = image::load_from_memory(bytes).context("decoding segmentation mask")?;
	Ok(image.to_luma8())
}

/// Fails unless `mask` matches the size of `image`.
pub fn check_mask_size(mask: &GrayImage, image: &RgbImage) -> Result<()> {
	ensure!(
		mask.dimensions() == image.dimensions(),
		"mask is {}x{} but the image is {}x{}",
		mask.width(),
		mask.height(),
		image.width(),
		image.height()
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{ImageFormat, Luma};
	use std::io::Cursor;

	#[test]
	fn decodes_png_mask() {
		let mut mask = GrayImage::new(3, 2);
		mask.put_pixel(1, 1, Luma([255]));
		let mut buffer = Cursor::new(Vec::new());
		mask.write_to(&mut buffer, ImageFormat::Png).unwrap();

		let decoded = decode_mask(buffer.get_ref()).unwrap();
		assert_eq!(decoded, mask);
		assert!(decode_mask(b"nope").is_err());
	}

	#[test]
	fn mask_size_must_match() {
		let image = RgbImage::new(4, 4);
		assert!(check_mask_size(&GrayImage::new(4, 4), &image).is_ok());
		assert_eq!(
			check_mask_size(&GrayImage::new(4, 3), &image).unwrap_err().to_string(),
			"mask is 4x3 but the image is 4x4"
		);
	}
}
