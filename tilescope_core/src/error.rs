//! Errors caused by the client rather than by the service.
//!
//! Everything in tilescope returns `anyhow::Result`. A [`RequestError`] travels inside the
//! `anyhow::Error` so that the HTTP layer can recover it with `downcast_ref` and answer
//! with a 4xx status and a structured body instead of a 500.

use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
	/// The request is malformed or violates a limit.
	#[error("{0}")]
	Validation(String),

	/// The requested area would need more tiles than allowed at this zoom level.
	#[error("Selected area is too large for zoom level {zoom}")]
	AreaTooLarge { zoom: u8, requested_tiles: u64, max_tiles: u64 },

	/// The request was valid but there is no data for it.
	#[error("{0}")]
	NotFound(String),
}

impl RequestError {
	pub fn validation(message: impl Into<String>) -> Self {
		RequestError::Validation(message.into())
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		RequestError::NotFound(message.into())
	}

	#[must_use]
	pub fn message(&self) -> String {
		self.to_string()
	}

	/// Machine readable details, only present for errors that carry numbers.
	#[must_use]
	pub fn details(&self) -> Option<Value> {
		match self {
			RequestError::AreaTooLarge {
				requested_tiles,
				max_tiles,
				..
			} => Some(json!({
				"requested_tiles": requested_tiles,
				"max_tiles": max_tiles,
			})),
			_ => None,
		}
	}

	/// Finds a `RequestError` anywhere in the chain of an `anyhow::Error`.
	#[must_use]
	pub fn find(err: &anyhow::Error) -> Option<&RequestError> {
		err.chain().find_map(|cause| cause.downcast_ref::<RequestError>())
	}
}
