//! The `cors` section. Origin patterns are interpreted by `server::cors`.

use serde::Deserialize;

const LOCAL_FRONT_ENDS: [&str; 2] = ["http://localhost:3000", "http://localhost:8080"];

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
	/// Exact origins, `*`, `*suffix`, `prefix*` or `/regex/`.
	#[serde(default = "local_front_ends")]
	pub allowed_origins: Vec<String>,

	/// Preflight cache lifetime; the server falls back to one day.
	#[serde(default)]
	pub max_age_seconds: Option<u64>,
}

fn local_front_ends() -> Vec<String> {
	LOCAL_FRONT_ENDS.iter().map(ToString::to_string).collect()
}

impl Default for CorsConfig {
	fn default() -> Self {
		CorsConfig {
			allowed_origins: local_front_ends(),
			max_age_seconds: None,
		}
	}
}
