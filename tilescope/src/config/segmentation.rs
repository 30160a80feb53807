use serde::Deserialize;
use std::path::PathBuf;
use tilescope_core::{
	TileLimits,
	utils::{DOWNLOAD_CONCURRENCY, RetryPolicy},
};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentationConfig {
	/// Base URL of the model service. Without it the segmentation endpoints answer 503.
	pub model_url: Option<String>,

	/// Model used for text prompts.
	pub text_model: String,

	/// Model used for point prompts: `vit_h`, `vit_l` or `vit_b`.
	pub point_model: String,

	/// Seconds to wait for the model.
	pub model_timeout_seconds: u64,

	pub min_zoom: u8,
	pub max_zoom: u8,

	/// Maximum number of imagery tiles per request.
	pub max_tiles: u64,

	/// Buffer in degrees around point prompts at `min_zoom`.
	pub base_buffer: f64,

	/// Preset name (`Satellite`, `Esri.WorldImagery`) or XYZ URL template.
	pub imagery_source: String,

	/// Number of imagery tiles downloaded at the same time.
	pub imagery_concurrency: usize,

	/// Keep the imagery, masks and GeoJSON of every request in this directory.
	pub artifacts_dir: Option<PathBuf>,

	pub retry: RetryPolicy,
}

impl Default for SegmentationConfig {
	fn default() -> Self {
		let limits = TileLimits::default();
		SegmentationConfig {
			model_url: None,
			text_model: String::from("sam2-hiera-large"),
			point_model: String::from("vit_h"),
			model_timeout_seconds: 300,
			min_zoom: limits.min_zoom,
			max_zoom: limits.max_zoom,
			max_tiles: limits.max_tiles,
			base_buffer: limits.base_buffer,
			imagery_source: String::from("Satellite"),
			imagery_concurrency: DOWNLOAD_CONCURRENCY,
			artifacts_dir: None,
			retry: RetryPolicy::default(),
		}
	}
}

impl SegmentationConfig {
	#[must_use]
	pub fn limits(&self) -> TileLimits {
		TileLimits {
			min_zoom: self.min_zoom,
			max_zoom: self.max_zoom,
			max_tiles: self.max_tiles,
			base_buffer: self.base_buffer,
		}
	}
}
