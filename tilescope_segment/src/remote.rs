//! A model served over HTTP.
//!
//! The image is posted as PNG, the prompt travels in the query string and the response
//! body is the mask as an image:
//!
//! - `POST {base}/segment/text?model=…&prompt=…&box_threshold=…&text_threshold=…`
//! - `POST {base}/segment/points?model=…&points=[[col,row],…]&labels=[1,-1,…]&box_threshold=…`

use crate::{PointPrompt, SegmentationModel, TextPrompt, check_mask_size, decode_mask};
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{GrayImage, ImageFormat, RgbImage};
use reqwest::Url;
use std::io::Cursor;
use tilescope_core::utils::HttpFetcher;

#[derive(Clone, Debug)]
pub struct RemoteModel {
	fetcher: HttpFetcher,
	base_url: String,
	text_model: String,
	point_model: String,
}

impl RemoteModel {
	pub fn new(fetcher: HttpFetcher, base_url: &str, text_model: &str, point_model: &str) -> Result<RemoteModel> {
		let base_url = base_url.trim_end_matches('/').to_string();
		Url::parse(&base_url).with_context(|| format!("invalid model URL '{base_url}'"))?;
		Ok(RemoteModel {
			fetcher,
			base_url,
			text_model: text_model.to_string(),
			point_model: point_model.to_string(),
		})
	}

	async fn post(&self, path: &str, params: &[(&str, String)], image: &RgbImage) -> Result<GrayImage> {
		let url = Url::parse_with_params(&format!("{}{path}", self.base_url), params)?;

		let mut png = Cursor::new(Vec::new());
		image
			.write_to(&mut png, ImageFormat::Png)
			.context("encoding image for the model")?;

		let response = self
			.fetcher
			.post_bytes(url.as_str(), "image/png", png.into_inner())
			.await
			.with_context(|| format!("calling segmentation model at {}", self.base_url))?;

		let mask = decode_mask(&response)?;
		check_mask_size(&mask, image)?;
		Ok(mask)
	}
}

#[async_trait]
impl SegmentationModel for RemoteModel {
	fn name(&self) -> String {
		format!("{} / {} at {}", self.text_model, self.point_model, self.base_url)
	}

	async fn segment_text(&self, image: &RgbImage, prompt: &TextPrompt) -> Result<GrayImage> {
		let params = [
			("model", self.text_model.clone()),
			("prompt", prompt.text.clone()),
			("box_threshold", prompt.box_threshold.to_string()),
			("text_threshold", prompt.text_threshold.to_string()),
		];
		self.post("/segment/text", &params, image).await
	}

	async fn segment_points(&self, image: &RgbImage, prompt: &PointPrompt) -> Result<GrayImage> {
		let params = [
			("model", self.point_model.clone()),
			("points", serde_json::to_string(&prompt.points)?),
			("labels", serde_json::to_string(&prompt.labels)?),
			("box_threshold", prompt.box_threshold.to_string()),
		];
		self.post("/segment/points", &params, image).await
	}
}
