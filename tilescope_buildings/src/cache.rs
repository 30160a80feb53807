//! On-disk cache of building footprints, one GeoJSON FeatureCollection per quadkey.
//!
//! Layout below `data_dir/cache_dir`:
//! - `{quadkey}_processed.json`: the footprints of one dataset tile
//! - `index.json`: `[{"quad_key": ..., "file": ...}]` for every downloaded tile

use anyhow::{Context, Result};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::{
	fs,
	path::{Path, PathBuf},
};
use tilescope_core::QuadKey;

const INDEX_FILE: &str = "index.json";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheEntry {
	pub quad_key: QuadKey,
	pub file: String,
}

#[derive(Clone, Debug)]
pub struct BuildingCache {
	dir: PathBuf,
}

impl BuildingCache {
	/// Opens the cache at `data_dir/cache_dir`, creating the directories if needed.
	pub fn open(data_dir: &Path, cache_dir: &str) -> Result<BuildingCache> {
		let dir = data_dir.join(cache_dir);
		fs::create_dir_all(&dir).with_context(|| format!("Failed to create cache directory {dir:?}"))?;
		Ok(BuildingCache { dir })
	}

	#[must_use]
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	#[must_use]
	pub fn path_for(&self, quad_key: &QuadKey) -> PathBuf {
		self.dir.join(format!("{quad_key}_processed.json"))
	}

	#[must_use]
	pub fn contains(&self, quad_key: &QuadKey) -> bool {
		self.path_for(quad_key).is_file()
	}

	pub fn write(&self, quad_key: &QuadKey, collection: &FeatureCollection) -> Result<CacheEntry> {
		let path = self.path_for(quad_key);
		let json = serde_json::to_vec(collection)?;
		fs::write(&path, json).with_context(|| format!("Failed to write {path:?}"))?;
		log::debug!("cached {} buildings of {quad_key} in {path:?}", collection.features.len());
		Ok(CacheEntry {
			quad_key: quad_key.clone(),
			file: path.to_string_lossy().into_owned(),
		})
	}

	/// Reads the footprints of `quad_key`, `None` if that tile was never downloaded.
	pub fn read(&self, quad_key: &QuadKey) -> Result<Option<FeatureCollection>> {
		let path = self.path_for(quad_key);
		if !path.is_file() {
			return Ok(None);
		}
		let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {path:?}"))?;
		let collection = text
			.parse::<FeatureCollection>()
			.with_context(|| format!("Failed to parse {path:?}"))?;
		Ok(Some(collection))
	}

	pub fn index(&self) -> Result<Vec<CacheEntry>> {
		let path = self.dir.join(INDEX_FILE);
		if !path.is_file() {
			return Ok(Vec::new());
		}
		let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {path:?}"))?;
		serde_json::from_str(&text).with_context(|| format!("Failed to parse {path:?}"))
	}

	/// Merges `entries` into `index.json`. Newer entries replace older ones for the same quadkey.
	pub fn update_index(&self, entries: &[CacheEntry]) -> Result<()> {
		let mut index = self.index()?;
		index.retain(|old| !entries.iter().any(|new| new.quad_key == old.quad_key));
		index.extend_from_slice(entries);
		index.sort();

		let path = self.dir.join(INDEX_FILE);
		fs::write(&path, serde_json::to_string_pretty(&index)?).with_context(|| format!("Failed to write {path:?}"))
	}
}
