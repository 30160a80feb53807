//! JSON error responses.
//!
//! Every failure of the API is answered with
//! `{"error": {"message": "...", "details": {...}}}` where `details` is optional.
//! The status code depends on the service and on whether a [`RequestError`] is found in
//! the error chain.

use axum::{
	Json,
	extract::rejection::JsonRejection,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tilescope_core::RequestError;

#[derive(Clone, Debug, PartialEq)]
pub struct ApiError {
	pub status: StatusCode,
	pub message: String,
	pub details: Option<Value>,
}

impl ApiError {
	pub fn new(status: StatusCode, message: impl Into<String>) -> ApiError {
		ApiError {
			status,
			message: message.into(),
			details: None,
		}
	}

	#[must_use]
	pub fn with_details(mut self, details: Option<Value>) -> ApiError {
		self.details = details;
		self
	}

	pub fn bad_request(message: impl Into<String>) -> ApiError {
		ApiError::new(StatusCode::BAD_REQUEST, message)
	}

	pub fn unavailable(message: impl Into<String>) -> ApiError {
		ApiError::new(StatusCode::SERVICE_UNAVAILABLE, message)
	}

	/// Segmentation: client errors are 400 (404 if nothing was found), the rest is 500.
	pub fn from_segmentation(err: &anyhow::Error) -> ApiError {
		ApiError::from_error(err, StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Buildings: everything but "not found" is reported as a bad request.
	pub fn from_buildings(err: &anyhow::Error) -> ApiError {
		ApiError::from_error(err, StatusCode::BAD_REQUEST)
	}

	fn from_error(err: &anyhow::Error, fallback: StatusCode) -> ApiError {
		match RequestError::find(err) {
			Some(request_error) => {
				let status = match request_error {
					RequestError::NotFound(_) => StatusCode::NOT_FOUND,
					_ => StatusCode::BAD_REQUEST,
				};
				log::debug!("send {status}: {}", format_error_chain(err));
				ApiError::new(status, request_error.message()).with_details(request_error.details())
			}
			None => {
				log::warn!("send {fallback}. Error:\n{}", format_error_chain(err));
				ApiError::new(fallback, err.to_string())
			}
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		log::debug!("rejected request body: {rejection}");
		ApiError::new(rejection.status(), rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let mut error = Map::new();
		error.insert("message".into(), Value::String(self.message));
		if let Some(details) = self.details {
			error.insert("details".into(), details);
		}
		(self.status, Json(json!({ "error": error }))).into_response()
	}
}

/// The error and all its causes, one per line.
pub fn format_error_chain(err: &anyhow::Error) -> String {
	let mut result = err.to_string();
	for (i, cause) in err.chain().skip(1).enumerate() {
		if i == 0 {
			result.push_str("\n  Caused by:");
		}
		result.push_str("\n    ");
		result.push_str(&cause.to_string());
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::Context;
	use axum::body::to_bytes;
	use pretty_assertions::assert_eq;

	async fn body_of(error: ApiError) -> (StatusCode, Value) {
		let response = error.into_response();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		(status, serde_json::from_slice(&bytes).unwrap())
	}

	#[tokio::test]
	async fn area_too_large_carries_details() {
		let err = anyhow::Error::new(RequestError::AreaTooLarge {
			zoom: 20,
			requested_tiles: 3000,
			max_tiles: 2000,
		});
		let (status, body) = body_of(ApiError::from_segmentation(&err)).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(
			body,
			json!({"error": {
				"message": "Selected area is too large for zoom level 20",
				"details": {"requested_tiles": 3000, "max_tiles": 2000}
			}})
		);
	}

	#[tokio::test]
	async fn internal_errors_depend_on_the_service() {
		let err = anyhow::anyhow!("connection refused").context("calling segmentation model");

		let (status, body) = body_of(ApiError::from_segmentation(&err)).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, json!({"error": {"message": "calling segmentation model"}}));

		let (status, _) = body_of(ApiError::from_buildings(&err)).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[test]
	fn not_found_is_404_behind_context() {
		let err = anyhow::Error::new(RequestError::not_found("No building data found for the given bbox"))
			.context("handling request");
		let error = ApiError::from_buildings(&err);
		assert_eq!(error.status, StatusCode::NOT_FOUND);
		assert_eq!(error.message, "No building data found for the given bbox");
		assert_eq!(error.details, None);
	}

	#[test]
	fn format_error_chain_single_error() {
		assert_eq!(format_error_chain(&anyhow::anyhow!("Simple error")), "Simple error");
	}

	#[test]
	fn format_error_chain_with_context() {
		let err = Err::<(), _>(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"))
			.context("Failed to read cache")
			.context("Query failed")
			.unwrap_err();
		let lines: Vec<String> = format_error_chain(&err).lines().map(String::from).collect();
		assert_eq!(
			lines,
			vec![
				"Query failed",
				"  Caused by:",
				"    Failed to read cache",
				"    file not found"
			]
		);
	}
}
