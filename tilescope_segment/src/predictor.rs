use crate::{
	ArtifactStore, MultiPromptRequest, PointPrompt, PointPromptRequest, SegmentationModel, TextPrompt,
	TextPromptRequest, check_mask_size, new_request_id,
};
use anyhow::{Context, Result};
use geojson::FeatureCollection;
use image::GrayImage;
use serde::Serialize;
use serde_json::Value;
use std::{sync::Arc, time::Instant};
use tilescope_core::{
	Crs, GeoBBox, RequestError, TileLimits,
	utils::{RetryPolicy, retry},
};
use tilescope_geometry::{collection_of, mask_to_features, reproject_collection};
use tilescope_imagery::{GeoRaster, ImageryDownloader};

const RESULT_VERSION: &str = "1.0";

/// Body of a successful segmentation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentationResult {
	/// Always `null`; failures are reported as errors instead.
	pub errors: Option<Value>,
	pub version: String,
	pub predictions: String,
	pub geojson: FeatureCollection,
}

impl SegmentationResult {
	#[must_use]
	pub fn success(geojson: FeatureCollection) -> SegmentationResult {
		SegmentationResult {
			errors: None,
			version: RESULT_VERSION.to_string(),
			predictions: format!("Successfully found {} features", geojson.features.len()),
			geojson,
		}
	}
}

fn finish(id: &str, mut features: FeatureCollection) -> Result<FeatureCollection> {
	if features.features.is_empty() {
		log::info!("request {id}: no features found");
		return Err(RequestError::validation("No features found in the specified area").into());
	}
	reproject_collection(&mut features, Crs::WebMercator, Crs::Wgs84);
	log::info!("request {id}: found {} features", features.features.len());
	Ok(features)
}

fn parse_bbox(values: &[f64]) -> Result<GeoBBox, RequestError> {
	GeoBBox::try_from(values.to_vec()).map_err(|e| RequestError::validation(format!("{e:#}")))
}

fn check_prompt(text: &str) -> Result<(), RequestError> {
	let text = text.trim();
	if text.is_empty() {
		return Err(RequestError::validation("Text prompt cannot be empty"));
	}
	if text.chars().count() < 3 {
		return Err(RequestError::validation("Text prompt must be at least 3 characters long"));
	}
	Ok(())
}

/// Runs segmentation requests from validation to WGS84 GeoJSON.
#[derive(Debug)]
pub struct SegmentationPredictor {
	limits: TileLimits,
	retry: RetryPolicy,
	imagery: ImageryDownloader,
	model: Arc<dyn SegmentationModel>,
	artifacts: Option<ArtifactStore>,
}

impl SegmentationPredictor {
	#[must_use]
	pub fn new(imagery: ImageryDownloader, model: Arc<dyn SegmentationModel>) -> SegmentationPredictor {
		SegmentationPredictor {
			limits: TileLimits::default(),
			retry: RetryPolicy::default(),
			imagery,
			model,
			artifacts: None,
		}
	}

	#[must_use]
	pub fn with_limits(mut self, limits: TileLimits) -> Self {
		self.limits = limits;
		self
	}

	#[must_use]
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	#[must_use]
	pub fn with_artifacts(mut self, artifacts: ArtifactStore) -> Self {
		self.artifacts = Some(artifacts);
		self
	}

	#[must_use]
	pub fn limits(&self) -> &TileLimits {
		&self.limits
	}

	/// Segments the objects described by a text prompt inside a bounding box.
	pub async fn segment_text(&self, request: &TextPromptRequest) -> Result<SegmentationResult> {
		request.validate()?;
		let bbox = parse_bbox(&request.bounding_box)?;
		check_prompt(&request.text_prompt)?;
		self.limits.check_zoom(request.zoom_level)?;
		let tiles = self.limits.check_area(&bbox, request.zoom_level)?;

		let id = new_request_id();
		log::info!(
			"request {id}: text prompt '{}' in {bbox} at zoom {} ({tiles} tiles)",
			request.text_prompt,
			request.zoom_level
		);

		let raster = self.fetch_imagery(&id, &bbox, request.zoom_level).await?;
		let prompt = TextPrompt {
			text: request.text_prompt.trim().to_string(),
			box_threshold: request.box_threshold,
			text_threshold: request.text_threshold,
		};
		let mask = self.run_text_model(&id, &raster, &prompt).await?;
		let features = self.trace(&id, &raster, &mask)?;

		finish(&id, features).map(SegmentationResult::success)
	}

	/// Segments the object marked by include and exclude points.
	///
	/// The imagery covers all points plus a buffer that shrinks with the zoom level.
	pub async fn segment_points(&self, request: &PointPromptRequest) -> Result<SegmentationResult> {
		request.validate()?;
		if request.points_include.is_empty() {
			return Err(RequestError::validation("At least one include point must be provided").into());
		}
		self.limits.check_zoom(request.zoom_level)?;

		let points: Vec<[f64; 2]> = request
			.points_include
			.iter()
			.chain(request.points_exclude())
			.copied()
			.collect();
		let bbox = GeoBBox::from_points(&points, self.limits.buffer_for_zoom(request.zoom_level))
			.map_err(|e| RequestError::validation(format!("{e:#}")))?;
		let tiles = self.limits.check_area(&bbox, request.zoom_level)?;

		let id = new_request_id();
		log::info!(
			"request {id}: {} include and {} exclude points in {bbox} at zoom {} ({tiles} tiles)",
			request.points_include.len(),
			request.points_exclude().len(),
			request.zoom_level
		);

		let raster = self.fetch_imagery(&id, &bbox, request.zoom_level).await?;
		let prompt = PointPrompt {
			points: points.iter().map(|p| raster.lonlat_to_pixel(*p)).collect(),
			labels: request
				.points_include
				.iter()
				.map(|_| 1)
				.chain(request.points_exclude().iter().map(|_| -1))
				.collect(),
			box_threshold: request.box_threshold,
		};

		let start = Instant::now();
		let mask = self
			.model
			.segment_points(&raster.image, &prompt)
			.await
			.with_context(|| format!("running point segmentation with {}", self.model.name()))?;
		log::info!("request {id}: segmentation took {:.2}s", start.elapsed().as_secs_f64());

		let features = self.trace(&id, &raster, &mask)?;
		finish(&id, features).map(SegmentationResult::success)
	}

	/// Runs several text prompts on the same imagery.
	///
	/// Every feature carries the prompt that found it in its `prompt` property.
	pub async fn predict(&self, request: &MultiPromptRequest) -> Result<FeatureCollection> {
		request.validate()?;
		let bbox = parse_bbox(&request.bounding_box)?;
		for prompt in &request.text_prompts {
			check_prompt(&prompt.value)?;
		}
		self.limits.check_zoom(request.zoom_level)?;
		let tiles = self.limits.check_area(&bbox, request.zoom_level)?;

		let id = new_request_id();
		log::info!(
			"request {id}: {} prompts in {bbox} at zoom {} ({tiles} tiles)",
			request.text_prompts.len(),
			request.zoom_level
		);

		let raster = self.fetch_imagery(&id, &bbox, request.zoom_level).await?;

		let mut features = Vec::new();
		for (index, config) in request.text_prompts.iter().enumerate() {
			let prompt = TextPrompt {
				text: config.value.trim().to_string(),
				box_threshold: config.box_threshold,
				text_threshold: config.text_threshold,
			};
			let prompt_id = format!("{id}_{index}");
			let mask = self.run_text_model(&prompt_id, &raster, &prompt).await?;
			let mut found = self.trace(&prompt_id, &raster, &mask)?.features;
			log::debug!("request {id}: '{}' found {} features", prompt.text, found.len());

			for feature in &mut found {
				feature.set_property("prompt", prompt.text.clone());
			}
			features.append(&mut found);
		}

		finish(&id, collection_of(features))
	}

	/// Downloads the imagery, retrying transient download failures.
	async fn fetch_imagery(&self, id: &str, bbox: &GeoBBox, zoom: u8) -> Result<GeoRaster> {
		let raster = retry(&self.retry, "imagery download", || self.imagery.fetch(bbox, zoom)).await?;
		log::debug!("request {id}: imagery is {}x{} pixels", raster.width(), raster.height());
		if let Some(store) = &self.artifacts {
			store.save_imagery(id, &raster)?;
		}
		Ok(raster)
	}

	async fn run_text_model(&self, id: &str, raster: &GeoRaster, prompt: &TextPrompt) -> Result<GrayImage> {
		let start = Instant::now();
		let mask = self
			.model
			.segment_text(&raster.image, prompt)
			.await
			.with_context(|| format!("running text segmentation with {}", self.model.name()))?;
		log::info!("request {id}: segmentation took {:.2}s", start.elapsed().as_secs_f64());
		Ok(mask)
	}

	/// Traces the mask into Web-Mercator polygons.
	fn trace(&self, id: &str, raster: &GeoRaster, mask: &GrayImage) -> Result<FeatureCollection> {
		check_mask_size(mask, &raster.image)?;
		let features = mask_to_features(mask, &raster.pixel_grid());
		if let Some(store) = &self.artifacts {
			store.save_mask(id, mask)?;
			store.save_geojson(id, &features)?;
		}
		Ok(features)
	}
}
