//! Router composition. Lifecycle, CORS and protection layers live in `api_server`.

use super::handlers::{
	AppState, buildings_report, download_buildings, health, predict, query_buildings, segment_interactive, segment_text,
};
use axum::{
	Router,
	routing::{get, post},
};

/// Liveness check, served even if the API is disabled.
pub fn status_router() -> Router {
	Router::new().route("/status", get(|| async { "ready!" }))
}

/// The JSON API.
pub fn api_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/predict", post(predict))
		.route("/segment/text_prompt", post(segment_text))
		.route("/segment/interactive", post(segment_interactive))
		.route("/query/buildings", post(query_buildings))
		.route("/download/buildings", post(download_buildings))
		.route("/buildings", post(buildings_report))
		.with_state(state)
}
