use super::{BuildingsConfig, CorsConfig, LoggingConfig, SegmentationConfig, ServerConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// HTTP server configuration
	#[serde(default)]
	pub server: ServerConfig,

	/// Cross-Origin Resource Sharing (CORS) settings
	#[serde(default)]
	pub cors: CorsConfig,

	/// Building footprint dataset and cache
	#[serde(default)]
	pub buildings: BuildingsConfig,

	/// Segmentation model, imagery and request limits
	#[serde(default)]
	pub segmentation: SegmentationConfig,

	#[serde(default)]
	pub logging: LoggingConfig,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	/// Parses a file. Relative local paths in it are resolved against the file's directory.
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("Failed to open config file {path:?}"))?;
		let mut config =
			Config::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse config file {path:?}"))?;

		if let Some(base) = path.parent() {
			config.resolve_paths(base);
		}
		Ok(config)
	}

	pub fn resolve_paths(&mut self, base: &Path) {
		let buildings = &mut self.buildings;
		if buildings.data_dir.is_relative() {
			buildings.data_dir = base.join(&buildings.data_dir);
		}

		let url = &buildings.dataset_url;
		if !url.starts_with("http://") && !url.starts_with("https://") && Path::new(url).is_relative() {
			buildings.dataset_url = base.join(url).to_string_lossy().into_owned();
		}

		if let Some(dir) = &mut self.segmentation.artifacts_dir {
			if dir.is_relative() {
				*dir = base.join(&*dir);
			}
		}
	}
}
