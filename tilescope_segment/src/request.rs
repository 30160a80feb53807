//! JSON bodies of the segmentation endpoints.
//!
//! Deserialization only checks the shape. [`validate`](TextPromptRequest::validate) adds the
//! range checks every request has to pass before the predictor applies its own limits.

use serde::{Deserialize, Serialize};
use tilescope_core::RequestError;

const SCHEMA_MAX_ZOOM: u8 = 22;

fn check_zoom_range(zoom_level: u8) -> Result<(), RequestError> {
	if (1..=SCHEMA_MAX_ZOOM).contains(&zoom_level) {
		Ok(())
	} else {
		Err(RequestError::validation(format!(
			"zoom_level must be between 1 and {SCHEMA_MAX_ZOOM}"
		)))
	}
}

fn check_thresholds(thresholds: &[f64]) -> Result<(), RequestError> {
	if thresholds.iter().all(|t| (0.0..=1.0).contains(t)) {
		Ok(())
	} else {
		Err(RequestError::validation("Threshold values must be between 0 and 1"))
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextPromptRequest {
	/// `[west, south, east, north]`; the length is checked by the predictor.
	pub bounding_box: Vec<f64>,
	pub text_prompt: String,
	pub zoom_level: u8,
	pub box_threshold: f64,
	pub text_threshold: f64,
}

impl Default for TextPromptRequest {
	fn default() -> Self {
		TextPromptRequest {
			bounding_box: vec![-96.81040, 32.97140, -96.81000, 32.97180],
			text_prompt: String::from("trees"),
			zoom_level: 19,
			box_threshold: 0.24,
			text_threshold: 0.24,
		}
	}
}

impl TextPromptRequest {
	pub fn validate(&self) -> Result<(), RequestError> {
		check_zoom_range(self.zoom_level)?;
		check_thresholds(&[self.box_threshold, self.text_threshold])
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointPromptRequest {
	/// `[lon, lat]` points on the object.
	pub points_include: Vec<[f64; 2]>,
	/// `[lon, lat]` points that must stay outside the object. `null` is accepted.
	pub points_exclude: Option<Vec<[f64; 2]>>,
	pub zoom_level: u8,
	pub box_threshold: f64,
}

impl Default for PointPromptRequest {
	fn default() -> Self {
		PointPromptRequest {
			points_include: Vec::new(),
			points_exclude: None,
			zoom_level: 19,
			box_threshold: 0.24,
		}
	}
}

impl PointPromptRequest {
	pub fn validate(&self) -> Result<(), RequestError> {
		check_zoom_range(self.zoom_level)?;
		check_thresholds(&[self.box_threshold])
	}

	#[must_use]
	pub fn points_exclude(&self) -> &[[f64; 2]] {
		self.points_exclude.as_deref().unwrap_or_default()
	}
}

/// One text prompt of a [`MultiPromptRequest`] with its own thresholds.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
	pub value: String,
	#[serde(default = "PromptConfig::default_text_threshold")]
	pub text_threshold: f64,
	#[serde(default = "PromptConfig::default_box_threshold")]
	pub box_threshold: f64,
}

impl PromptConfig {
	fn default_text_threshold() -> f64 {
		0.25
	}

	fn default_box_threshold() -> f64 {
		0.3
	}

	#[must_use]
	pub fn new(value: &str) -> PromptConfig {
		PromptConfig {
			value: value.to_string(),
			text_threshold: Self::default_text_threshold(),
			box_threshold: Self::default_box_threshold(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MultiPromptRequest {
	pub bounding_box: Vec<f64>,
	pub zoom_level: u8,
	pub text_prompts: Vec<PromptConfig>,
}

impl MultiPromptRequest {
	pub fn validate(&self) -> Result<(), RequestError> {
		check_zoom_range(self.zoom_level)?;
		if self.text_prompts.is_empty() {
			return Err(RequestError::validation("At least one text prompt must be provided"));
		}
		for prompt in &self.text_prompts {
			check_thresholds(&[prompt.box_threshold, prompt.text_threshold])?;
		}
		Ok(())
	}
}
