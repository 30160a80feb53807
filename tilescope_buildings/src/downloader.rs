use crate::{BuildingCache, CacheEntry, DatasetIndex};
use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use geojson::{Feature, Geometry};
use std::{collections::BTreeSet, io::Read};
use tilescope_core::{
	QuadKey, TileBBox,
	utils::{HttpFetcher, run_bounded},
};
use tilescope_geometry::{collection_of, geometry_bounds};
use tokio::sync::OnceCell;

/// Quadkeys at `level` touched by the bounds of any of `geometries`, sorted and unique.
pub fn quadkeys_for(geometries: &[Geometry], level: u8) -> Result<BTreeSet<QuadKey>> {
	let mut keys = BTreeSet::new();
	for geometry in geometries {
		let Some(bounds) = geometry_bounds(geometry) else {
			log::warn!("skipping geometry without coordinates");
			continue;
		};
		keys.extend(TileBBox::from_geo(level, &bounds)?.quadkeys());
	}
	Ok(keys)
}

/// Downloads dataset tiles into a [`BuildingCache`].
pub struct BuildingDownloader {
	fetcher: HttpFetcher,
	cache: BuildingCache,
	dataset_source: String,
	dataset: OnceCell<DatasetIndex>,
	level: u8,
	concurrency: usize,
}

impl BuildingDownloader {
	#[must_use]
	pub fn new(fetcher: HttpFetcher, cache: BuildingCache, dataset_source: &str, level: u8, concurrency: usize) -> Self {
		BuildingDownloader {
			fetcher,
			cache,
			dataset_source: dataset_source.to_string(),
			dataset: OnceCell::new(),
			level,
			concurrency,
		}
	}

	async fn dataset(&self) -> Result<&DatasetIndex> {
		self
			.dataset
			.get_or_try_init(|| DatasetIndex::load(&self.dataset_source, &self.fetcher, self.level))
			.await
	}

	/// Downloads every dataset tile under `geometries` and returns the cached files.
	///
	/// A tile that cannot be fetched is logged and skipped, so the result may be partial.
	pub async fn download(&self, geometries: &[Geometry]) -> Result<Vec<CacheEntry>> {
		let quad_keys: Vec<QuadKey> = quadkeys_for(geometries, self.level)?.into_iter().collect();
		self.download_quads(quad_keys).await
	}

	/// Like [`download`](Self::download), but only for tiles that are not cached yet.
	///
	/// Nothing is fetched, not even the dataset index, if every tile is cached.
	pub async fn download_missing(&self, geometries: &[Geometry]) -> Result<Vec<CacheEntry>> {
		let missing: Vec<QuadKey> = quadkeys_for(geometries, self.level)?
			.into_iter()
			.filter(|quad_key| !self.cache.contains(quad_key))
			.collect();
		if missing.is_empty() {
			return Ok(Vec::new());
		}
		self.download_quads(missing).await
	}

	async fn download_quads(&self, quad_keys: Vec<QuadKey>) -> Result<Vec<CacheEntry>> {
		log::info!("downloading buildings for {} quadkeys", quad_keys.len());

		let dataset = self.dataset().await?;
		let results = run_bounded(quad_keys, self.concurrency, |quad_key| async move {
			self.download_quad(dataset, &quad_key).await
		})
		.await;

		let mut downloaded = Vec::new();
		for (quad_key, result) in results {
			match result {
				Ok(entry) => downloaded.push(entry),
				Err(e) => log::error!("Error downloading {quad_key}: {e:#}"),
			}
		}

		self.cache.update_index(&downloaded)?;
		Ok(downloaded)
	}

	async fn download_quad(&self, dataset: &DatasetIndex, quad_key: &QuadKey) -> Result<CacheEntry> {
		let links = dataset.links_for(quad_key);
		if links.is_empty() {
			bail!("the dataset has no file for quadkey {quad_key}");
		}

		let mut features = Vec::new();
		for link in links {
			let bytes = self.fetcher.get_bytes(&link.url).await?;
			let mut parsed = parse_feature_lines(&bytes).with_context(|| format!("parsing {}", link.url))?;
			log::debug!("{} buildings in {} ({})", parsed.len(), link.url, link.location);
			features.append(&mut parsed);
		}

		self.cache.write(quad_key, &collection_of(features))
	}
}

/// Parses newline-delimited GeoJSON features, optionally gzip compressed.
pub fn parse_feature_lines(bytes: &[u8]) -> Result<Vec<Feature>> {
	let text = if bytes.starts_with(&[0x1f, 0x8b]) {
		let mut text = String::new();
		GzDecoder::new(bytes)
			.read_to_string(&mut text)
			.context("decompressing gzip")?;
		text
	} else {
		String::from_utf8(bytes.to_vec()).context("data is not UTF-8")?
	};

	text
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.enumerate()
		.map(|(i, line)| {
			line
				.parse::<Feature>()
				.with_context(|| format!("invalid feature in line {}", i + 1))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::TempDir;
	use axum::{Router, http::StatusCode, routing::get};
	use flate2::{Compression, write::GzEncoder};
	use pretty_assertions::assert_eq;
	use std::{io::Write, time::Duration};

	const LINE_A: &str = r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[13.40,52.52],[13.41,52.52],[13.41,52.53],[13.40,52.52]]]},"properties":{"height":10.5,"confidence":-1.0}}"#;
	const LINE_B: &str = r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[13.42,52.52],[13.43,52.52],[13.43,52.53],[13.42,52.52]]]},"properties":{"height":-1.0,"confidence":0.9}}"#;

	fn gzip(text: &str) -> Vec<u8> {
		let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(text.as_bytes()).unwrap();
		encoder.finish().unwrap()
	}

	fn berlin() -> Geometry {
		r#"{"type":"Point","coordinates":[13.404954,52.520008]}"#.parse().unwrap()
	}

	#[test]
	fn parses_plain_and_gzip_lines() {
		let text = format!("{LINE_A}\n\n{LINE_B}\n");
		assert_eq!(parse_feature_lines(text.as_bytes()).unwrap().len(), 2);
		assert_eq!(parse_feature_lines(&gzip(&text)).unwrap().len(), 2);

		let err = parse_feature_lines(format!("{LINE_A}\nnot json").as_bytes()).unwrap_err();
		assert_eq!(err.to_string(), "invalid feature in line 2");
	}

	#[test]
	fn quadkeys_of_geometries() {
		let keys = quadkeys_for(&[berlin()], 9).unwrap();
		assert_eq!(keys.into_iter().map(|k| k.to_string()).collect::<Vec<_>>(), vec!["120210233"]);

		let wide: Geometry = r#"{"type":"LineString","coordinates":[[8.0653,51.3563],[12.3528,52.2564]]}"#
			.parse()
			.unwrap();
		assert_eq!(quadkeys_for(&[wide, berlin()], 9).unwrap().len(), 22);
	}

	async fn dataset_server() -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let base = format!("http://{}", listener.local_addr().unwrap());
		let csv = format!(
			"Location,QuadKey,Url,Size,UploadDate\n\
			Germany,120210233,{base}/de.csv.gz,1KB,2023-04-25\n\
			Poland,120210233,{base}/pl.csv,1KB,2023-04-25\n\
			Broken,120210232,{base}/missing.csv.gz,1KB,2023-04-25\n"
		);
		let router = Router::new()
			.route(
				"/dataset-links.csv",
				get(move || {
					let csv = csv.clone();
					async move { csv }
				}),
			)
			.route("/de.csv.gz", get(|| async { gzip(LINE_A) }))
			.route("/pl.csv", get(|| async { LINE_B }))
			.route("/missing.csv.gz", get(|| async { StatusCode::NOT_FOUND }));
		tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
		base
	}

	#[tokio::test]
	async fn downloads_into_cache_with_partial_success() {
		let base = dataset_server().await;
		let tmp = TempDir::new().unwrap();
		let cache = BuildingCache::open(tmp.path(), "cache").unwrap();
		let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
		let downloader = BuildingDownloader::new(
			fetcher,
			cache.clone(),
			&format!("{base}/dataset-links.csv"),
			9,
			5,
		);

		// 120210232 is the western neighbour of Berlin's tile and has a broken link
		let area: Geometry = r#"{"type":"LineString","coordinates":[[12.9,52.5],[13.4,52.5]]}"#.parse().unwrap();
		let downloaded = downloader.download(&[area]).await.unwrap();

		assert_eq!(downloaded.len(), 1);
		assert_eq!(downloaded[0].quad_key.to_string(), "120210233");

		let cached = cache.read(&"120210233".parse().unwrap()).unwrap().unwrap();
		assert_eq!(cached.features.len(), 2);
		assert_eq!(cache.index().unwrap(), downloaded);
	}

	#[tokio::test]
	async fn downloads_only_missing_tiles() {
		let base = dataset_server().await;
		let tmp = TempDir::new().unwrap();
		let cache = BuildingCache::open(tmp.path(), "cache").unwrap();
		let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
		let downloader = BuildingDownloader::new(
			fetcher,
			cache.clone(),
			&format!("{base}/dataset-links.csv"),
			9,
			5,
		);

		let downloaded = downloader.download_missing(&[berlin()]).await.unwrap();
		assert_eq!(downloaded.len(), 1);
		assert!(cache.contains(&"120210233".parse().unwrap()));

		// cached now
		assert_eq!(downloader.download_missing(&[berlin()]).await.unwrap(), vec![]);
	}

	#[tokio::test]
	async fn cached_tiles_need_no_dataset_index() {
		let tmp = TempDir::new().unwrap();
		let cache = BuildingCache::open(tmp.path(), "cache").unwrap();
		cache
			.write(&"120210233".parse().unwrap(), &collection_of(Vec::new()))
			.unwrap();
		let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
		let downloader = BuildingDownloader::new(fetcher, cache, "http://127.0.0.1:9/dataset-links.csv", 9, 5);

		assert_eq!(downloader.download_missing(&[berlin()]).await.unwrap(), vec![]);
		assert!(downloader.download(&[berlin()]).await.is_err());
	}
}
