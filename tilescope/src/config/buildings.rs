use serde::Deserialize;
use std::path::PathBuf;
use tilescope_buildings::{DATASET_LINKS_URL, DATASET_ZOOM_LEVEL};
use tilescope_core::utils::DOWNLOAD_CONCURRENCY;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildingsConfig {
	/// Base directory for downloaded data.
	pub data_dir: PathBuf,

	/// Cache directory below `data_dir`.
	pub cache_dir: String,

	/// Quadkey level of the dataset files.
	pub zoom_level: u8,

	/// `dataset-links.csv` as URL or local file.
	pub dataset_url: String,

	/// Number of files downloaded at the same time.
	pub concurrency: usize,
}

impl Default for BuildingsConfig {
	fn default() -> Self {
		BuildingsConfig {
			data_dir: PathBuf::from("data"),
			cache_dir: String::from("cache"),
			zoom_level: DATASET_ZOOM_LEVEL,
			dataset_url: DATASET_LINKS_URL.to_string(),
			concurrency: DOWNLOAD_CONCURRENCY,
		}
	}
}
