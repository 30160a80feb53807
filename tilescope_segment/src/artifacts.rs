//! Intermediate files of segmentation requests, kept for inspection.
//!
//! Every request gets an id. If an artifacts directory is configured, the request stores
//! `satellite_{id}.png` (the imagery), `segment_{id}.png` (the model's mask) and
//! `segment_{id}.geojson` (the traced features) there. [`cleanup`] removes them again.

use anyhow::{Context, Result};
use geojson::FeatureCollection;
use image::{GrayImage, ImageFormat};
use std::{
	fs,
	path::{Path, PathBuf},
};
use tilescope_imagery::GeoRaster;
use uuid::Uuid;
use wildmatch::WildMatch;

/// File name patterns of everything an [`ArtifactStore`] writes.
pub const ARTIFACT_PATTERNS: [&str; 3] = ["satellite_*.png", "segment_*.png", "segment_*.geojson"];

/// A fresh request id.
#[must_use]
pub fn new_request_id() -> String {
	Uuid::new_v4().to_string()
}

#[derive(Clone, Debug)]
pub struct ArtifactStore {
	dir: PathBuf,
}

impl ArtifactStore {
	pub fn open(dir: &Path) -> Result<ArtifactStore> {
		fs::create_dir_all(dir).with_context(|| format!("Failed to create artifacts directory {dir:?}"))?;
		Ok(ArtifactStore { dir: dir.to_path_buf() })
	}

	#[must_use]
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	#[must_use]
	pub fn imagery_path(&self, id: &str) -> PathBuf {
		self.dir.join(format!("satellite_{id}.png"))
	}

	#[must_use]
	pub fn mask_path(&self, id: &str) -> PathBuf {
		self.dir.join(format!("segment_{id}.png"))
	}

	#[must_use]
	pub fn geojson_path(&self, id: &str) -> PathBuf {
		self.dir.join(format!("segment_{id}.geojson"))
	}

	pub fn save_imagery(&self, id: &str, raster: &GeoRaster) -> Result<()> {
		let path = self.imagery_path(id);
		fs::write(&path, raster.encode_png()?).with_context(|| format!("Failed to write {path:?}"))
	}

	pub fn save_mask(&self, id: &str, mask: &GrayImage) -> Result<()> {
		let path = self.mask_path(id);
		mask
			.save_with_format(&path, ImageFormat::Png)
			.with_context(|| format!("Failed to write {path:?}"))
	}

	pub fn save_geojson(&self, id: &str, collection: &FeatureCollection) -> Result<()> {
		let path = self.geojson_path(id);
		fs::write(&path, serde_json::to_vec(collection)?).with_context(|| format!("Failed to write {path:?}"))
	}
}

/// Removes all artifact files directly inside `dir` and returns how many were removed.
///
/// Files that cannot be removed are logged and skipped.
pub fn cleanup(dir: &Path) -> Result<usize> {
	let patterns: Vec<WildMatch> = ARTIFACT_PATTERNS.iter().map(|p| WildMatch::new(p)).collect();

	let mut removed = 0;
	for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory {dir:?}"))? {
		let entry = entry?;
		let name = entry.file_name();
		let Some(name) = name.to_str() else {
			continue;
		};
		if !entry.file_type()?.is_file() || !patterns.iter().any(|p| p.matches(name)) {
			continue;
		}
		match fs::remove_file(entry.path()) {
			Ok(()) => {
				log::info!("removed temporary file {name}");
				removed += 1;
			}
			Err(e) => log::error!("Error removing {name}: {e}"),
		}
	}

	log::info!("cleaned up {removed} temporary files in {dir:?}");
	Ok(removed)
}
