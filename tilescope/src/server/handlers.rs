//! HTTP handlers of the JSON API.
//!
//! Handlers only translate between HTTP and the services in [`AppState`]. Failures are
//! mapped to [`ApiError`]s, which render the JSON error body.
//!
//! CORS headers are handled by the `CorsLayer` only.

use super::error::ApiError;
use crate::{API_VERSION, SERVICE_NAME};
use axum::{
	Json,
	extract::{State, rejection::JsonRejection},
};
use geojson::{FeatureCollection, Geometry};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tilescope_buildings::{BuildingDownloader, BuildingQuery, BuildingReport, bbox_polygon};
use tilescope_core::GeoBBox;
use tilescope_segment::{
	MultiPromptRequest, PointPromptRequest, SegmentationPredictor, SegmentationResult, TextPromptRequest,
};

/// Services shared by all handlers.
#[derive(Clone)]
pub struct AppState {
	/// `None` if no model is configured.
	pub segmentation: Option<Arc<SegmentationPredictor>>,
	pub downloader: Arc<BuildingDownloader>,
	pub query: Arc<BuildingQuery>,
}

impl AppState {
	fn predictor(&self) -> Result<&SegmentationPredictor, ApiError> {
		self
			.segmentation
			.as_deref()
			.ok_or_else(|| ApiError::unavailable("No segmentation model is configured"))
	}
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometriesRequest {
	pub geometries: Vec<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BBoxRequest {
	pub bbox: Vec<f64>,
}

pub async fn health() -> Json<Value> {
	Json(json!({ "name": SERVICE_NAME, "api_version": API_VERSION }))
}

pub async fn predict(
	State(state): State<AppState>,
	body: Result<Json<MultiPromptRequest>, JsonRejection>,
) -> ApiResult<FeatureCollection> {
	let Json(request) = body?;
	let predictor = state.predictor()?;
	log::debug!("predict {} prompts", request.text_prompts.len());

	let features = predictor
		.predict(&request)
		.await
		.map_err(|e| ApiError::from_segmentation(&e))?;
	Ok(Json(features))
}

pub async fn segment_text(
	State(state): State<AppState>,
	body: Result<Json<TextPromptRequest>, JsonRejection>,
) -> ApiResult<SegmentationResult> {
	let Json(request) = body?;
	let result = state
		.predictor()?
		.segment_text(&request)
		.await
		.map_err(|e| ApiError::from_segmentation(&e))?;
	Ok(Json(result))
}

pub async fn segment_interactive(
	State(state): State<AppState>,
	body: Result<Json<PointPromptRequest>, JsonRejection>,
) -> ApiResult<SegmentationResult> {
	let Json(request) = body?;
	let result = state
		.predictor()?
		.segment_points(&request)
		.await
		.map_err(|e| ApiError::from_segmentation(&e))?;
	Ok(Json(result))
}

pub async fn query_buildings(
	State(state): State<AppState>,
	body: Result<Json<GeometriesRequest>, JsonRejection>,
) -> ApiResult<FeatureCollection> {
	let Json(request) = body?;
	let query = state.query.clone();

	// Reading the cache is blocking file I/O.
	let result = tokio::task::spawn_blocking(move || query.query(&request.geometries))
		.await
		.map_err(|e| ApiError::from_buildings(&e.into()))?;
	Ok(Json(result.map_err(|e| ApiError::from_buildings(&e))?))
}

pub async fn download_buildings(
	State(state): State<AppState>,
	body: Result<Json<GeometriesRequest>, JsonRejection>,
) -> ApiResult<Value> {
	let Json(request) = body?;
	let downloaded = state
		.downloader
		.download(&request.geometries)
		.await
		.map_err(|e| ApiError::from_buildings(&e))?;
	Ok(Json(json!({ "status": "success", "downloaded": downloaded })))
}

pub async fn buildings_report(
	State(state): State<AppState>,
	body: Result<Json<BBoxRequest>, JsonRejection>,
) -> ApiResult<BuildingReport> {
	let Json(request) = body?;
	let bbox = GeoBBox::try_from(request.bbox).map_err(|e| ApiError::bad_request(format!("{e:#}")))?;

	// Tiles that were never downloaded are fetched first.
	state
		.downloader
		.download_missing(&[bbox_polygon(&bbox)])
		.await
		.map_err(|e| ApiError::from_buildings(&e))?;

	let query = state.query.clone();

	let result = tokio::task::spawn_blocking(move || query.report(&bbox))
		.await
		.map_err(|e| ApiError::from_buildings(&e.into()))?;
	Ok(Json(result.map_err(|e| ApiError::from_buildings(&e))?))
}
