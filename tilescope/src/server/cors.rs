//! Builds the CORS layer from the configured origin patterns.
//!
//! Supported `allowed_origins` patterns:
//! - `"*"` allows every origin
//! - `"*.example.com"` matches by suffix
//! - `"https://dev-*"` matches by prefix
//! - `"/^https://(foo|bar)\.example\.com$/"` is a regular expression
//! - anything else must match exactly
//!
//! The browser front ends post JSON, so every method and request header is allowed.

use anyhow::{Context, Result};
use axum::http::{header::HeaderValue, request::Parts};
use regex::Regex;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync + 'static>;

/// Preflight cache duration if none is configured.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 86400;

fn origin_predicate(pattern: &str) -> Result<Predicate> {
	Ok(if pattern == "*" {
		Box::new(|_: &str| true)
	} else if let Some(suffix) = pattern.strip_prefix('*').filter(|s| !s.is_empty() && !s.contains('*')) {
		let suffix = suffix.to_string();
		Box::new(move |origin: &str| origin.ends_with(&suffix))
	} else if let Some(prefix) = pattern.strip_suffix('*').filter(|s| !s.is_empty() && !s.contains('*')) {
		let prefix = prefix.to_string();
		Box::new(move |origin: &str| origin.starts_with(&prefix))
	} else if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
		let re = Regex::new(&pattern[1..pattern.len() - 1])
			.with_context(|| format!("invalid CORS origin pattern '{pattern}'"))?;
		Box::new(move |origin: &str| re.is_match(origin))
	} else {
		let exact = pattern.to_string();
		Box::new(move |origin: &str| origin == exact)
	})
}

/// A `CorsLayer` that admits an origin if any of `allowed_origins` matches it.
pub fn build_cors_layer(allowed_origins: &[String], max_age_seconds: Option<u64>) -> Result<CorsLayer> {
	let checks = allowed_origins
		.iter()
		.map(String::as_str)
		.map(origin_predicate)
		.collect::<Result<Vec<Predicate>>>()?;

	let layer = CorsLayer::new()
		.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _req: &Parts| {
			let origin = origin.to_str().unwrap_or("");
			checks.iter().any(|f| f(origin))
		}))
		.allow_methods(Any)
		.allow_headers(Any)
		.max_age(Duration::from_secs(max_age_seconds.unwrap_or(DEFAULT_MAX_AGE_SECONDS)));

	Ok(layer)
}
