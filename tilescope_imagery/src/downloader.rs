use crate::{GeoRaster, TileUrlTemplate};
use anyhow::{Context, Result, anyhow, ensure};
use image::{RgbImage, imageops};
use tilescope_core::{
	GeoBBox, TileBBox, TileCoord,
	utils::{DOWNLOAD_CONCURRENCY, HttpFetcher, IMAGERY_DOWNLOAD_ERROR, run_bounded},
};

/// Maximum number of tiles one mosaic may consist of.
const MAX_MOSAIC_TILES: u64 = 4096;

/// Downloads the imagery covering a bounding box from an XYZ tile service.
#[derive(Clone, Debug)]
pub struct ImageryDownloader {
	fetcher: HttpFetcher,
	template: TileUrlTemplate,
	concurrency: usize,
}

impl ImageryDownloader {
	#[must_use]
	pub fn new(fetcher: HttpFetcher, template: TileUrlTemplate) -> ImageryDownloader {
		ImageryDownloader {
			fetcher,
			template,
			concurrency: DOWNLOAD_CONCURRENCY,
		}
	}

	#[must_use]
	pub fn with_concurrency(mut self, concurrency: usize) -> Self {
		self.concurrency = concurrency;
		self
	}

	#[must_use]
	pub fn template(&self) -> &TileUrlTemplate {
		&self.template
	}

	/// Fetches all tiles touching `bbox` at `zoom`, stitches them and crops the mosaic to `bbox`.
	///
	/// If any tile fails, the whole fetch fails with an error starting with
	/// "Failed to download satellite imagery", which callers may retry.
	pub async fn fetch(&self, bbox: &GeoBBox, zoom: u8) -> Result<GeoRaster> {
		let mut bbox = *bbox;
		bbox.limit_to_mercator();
		let tiles = TileBBox::from_geo(zoom, &bbox)?;
		ensure!(
			tiles.count() <= MAX_MOSAIC_TILES,
			"{bbox} needs {} tiles at zoom {zoom}, at most {MAX_MOSAIC_TILES} are supported",
			tiles.count()
		);
		log::debug!("downloading {} imagery tiles {tiles:?}", tiles.count());

		let coords: Vec<TileCoord> = tiles.iter_coords().collect();
		let results = run_bounded(coords, self.concurrency, |coord| self.fetch_tile(coord)).await;

		let total = results.len();
		let mut images = Vec::with_capacity(total);
		let mut failures = Vec::new();
		for (coord, result) in results {
			match result {
				Ok(image) => images.push((coord, image)),
				Err(e) => {
					log::warn!("imagery tile {coord} failed: {e:#}");
					failures.push(e);
				}
			}
		}
		if let Some(first) = failures.into_iter().next() {
			return Err(anyhow!(
				"{IMAGERY_DOWNLOAD_ERROR}: {} of {total} tiles failed, first error: {first:#}",
				total - images.len()
			));
		}

		let mosaic = stitch(&tiles, images)?;
		mosaic
			.crop_to(&bbox)
			.with_context(|| format!("{IMAGERY_DOWNLOAD_ERROR}: cropping mosaic to {bbox}"))
	}

	async fn fetch_tile(&self, coord: TileCoord) -> Result<RgbImage> {
		let url = self.template.url_for(&coord);
		let bytes = self.fetcher.get_bytes(&url).await?;
		let image = image::load_from_memory(&bytes).with_context(|| format!("decoding tile {coord} from {url}"))?;
		Ok(image.to_rgb8())
	}
}

/// Places decoded tiles into one image. All tiles take the size of the first one.
fn stitch(tiles: &TileBBox, images: Vec<(TileCoord, RgbImage)>) -> Result<GeoRaster> {
	let tile_size = images
		.first()
		.map(|(_, image)| image.width())
		.ok_or_else(|| anyhow!("no imagery tiles to stitch"))?;
	ensure!(tile_size > 0, "imagery tiles must not be empty");

	let mut mosaic = RgbImage::new(tiles.width() * tile_size, tiles.height() * tile_size);
	for (coord, mut image) in images {
		if image.width() != tile_size || image.height() != tile_size {
			image = imageops::resize(&image, tile_size, tile_size, imageops::FilterType::Triangle);
		}
		let x = i64::from((coord.x - tiles.x_min) * tile_size);
		let y = i64::from((coord.y - tiles.y_min) * tile_size);
		imageops::replace(&mut mosaic, &image, x, y);
	}

	let nw = TileCoord {
		level: tiles.level,
		x: tiles.x_min,
		y: tiles.y_min,
	}
	.to_mercator_bbox();
	let se = TileCoord {
		level: tiles.level,
		x: tiles.x_max,
		y: tiles.y_max,
	}
	.to_mercator_bbox();

	GeoRaster::new(mosaic, [nw[0], se[1], se[2], nw[3]])
}
