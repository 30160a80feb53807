use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use tilescope_core::{QuadKey, utils::HttpFetcher};

/// One row of `dataset-links.csv`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DatasetLink {
	#[serde(rename = "Location")]
	pub location: String,
	#[serde(rename = "QuadKey")]
	pub quad_key: String,
	#[serde(rename = "Url")]
	pub url: String,
	#[serde(rename = "Size")]
	pub size: String,
	#[serde(rename = "UploadDate")]
	pub upload_date: String,
}

/// The files of the building dataset grouped by quadkey.
///
/// Some quadkeys span several countries and therefore have several files.
#[derive(Clone, Debug, Default)]
pub struct DatasetIndex {
	links: HashMap<QuadKey, Vec<DatasetLink>>,
}

impl DatasetIndex {
	/// Parses the CSV text. Quadkeys that lost their leading zeros, as happens when the
	/// file went through a spreadsheet, are padded back to `level` digits.
	pub fn from_csv(text: &str, level: u8) -> Result<DatasetIndex> {
		let mut reader = csv::Reader::from_reader(text.as_bytes());
		let mut links: HashMap<QuadKey, Vec<DatasetLink>> = HashMap::new();
		let mut count = 0usize;

		for record in reader.deserialize() {
			let link: DatasetLink = record.context("Failed to read dataset CSV record")?;
			let digits = format!("{:0>width$}", link.quad_key.trim(), width = level as usize);
			let quad_key: QuadKey = digits
				.parse()
				.with_context(|| format!("invalid quadkey in dataset row for {}", link.location))?;
			links.entry(quad_key).or_default().push(link);
			count += 1;
		}

		log::debug!("dataset index has {count} files for {} quadkeys", links.len());
		Ok(DatasetIndex { links })
	}

	/// Loads the index from an http(s) URL or a local file.
	pub async fn load(source: &str, fetcher: &HttpFetcher, level: u8) -> Result<DatasetIndex> {
		let text = if source.starts_with("http://") || source.starts_with("https://") {
			log::info!("downloading dataset index from {source}");
			fetcher.get_text(source).await?
		} else {
			tokio::fs::read_to_string(Path::new(source))
				.await
				.with_context(|| format!("Failed to read dataset index {source}"))?
		};
		DatasetIndex::from_csv(&text, level)
	}

	#[must_use]
	pub fn links_for(&self, quad_key: &QuadKey) -> &[DatasetLink] {
		self.links.get(quad_key).map(Vec::as_slice).unwrap_or_default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.links.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::NamedTempFile;
	use pretty_assertions::assert_eq;
	use std::time::Duration;

	const CSV: &str = "Location,QuadKey,Url,Size,UploadDate
UnitedStates,023010203,https://example.org/a.csv.gz,1.2MB,2023-04-25
Mexico,023010203,https://example.org/b.csv.gz,10KB,2023-04-25
Germany,120210233,https://example.org/c.csv.gz,4.5MB,2023-04-25
Brazil,21030112,https://example.org/d.csv.gz,2MB,2023-04-25
";

	#[test]
	fn groups_by_quadkey() {
		let index = DatasetIndex::from_csv(CSV, 9).unwrap();
		assert_eq!(index.len(), 3);

		let shared = index.links_for(&"023010203".parse().unwrap());
		assert_eq!(shared.len(), 2);
		assert_eq!(shared[1].location, "Mexico");

		let germany = index.links_for(&"120210233".parse().unwrap());
		assert_eq!(germany[0].url, "https://example.org/c.csv.gz");
		assert_eq!(germany[0].upload_date, "2023-04-25");

		assert!(index.links_for(&"333333333".parse().unwrap()).is_empty());
	}

	#[test]
	fn pads_stripped_leading_zeros() {
		let index = DatasetIndex::from_csv(CSV, 9).unwrap();
		assert_eq!(index.links_for(&"021030112".parse().unwrap())[0].location, "Brazil");
	}

	#[test]
	fn rejects_bad_rows() {
		assert!(DatasetIndex::from_csv("Location,QuadKey,Url,Size,UploadDate\nX,12a,u,1,d\n", 9).is_err());
		assert!(DatasetIndex::from_csv("Location,QuadKey\nX,1\n", 9).is_err());
	}

	#[tokio::test]
	async fn load_from_file() {
		let file = NamedTempFile::new("dataset-links.csv").unwrap();
		std::fs::write(&file, CSV).unwrap();
		let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
		let index = DatasetIndex::load(file.path().to_str().unwrap(), &fetcher, 9)
			.await
			.unwrap();
		assert_eq!(index.len(), 3);
		assert!(DatasetIndex::load("/nonexistent/links.csv", &fetcher, 9).await.is_err());
	}
}
