//! Retries with exponential backoff for operations that fail transiently.
//!
//! Only errors whose message (or the message of any error in their context chain)
//! contains one of the configured substrings are retried. Everything else, validation
//! errors in particular, is returned on first sight.

use anyhow::{Result, ensure};
use serde::Deserialize;
use std::{future::Future, time::Duration};
use tokio::time::sleep;

/// Error text of a failed imagery download, which is worth a second try.
pub const IMAGERY_DOWNLOAD_ERROR: &str = "Failed to download satellite imagery";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
	/// Total number of attempts, not the number of repetitions.
	pub max_retries: u32,
	pub initial_delay_ms: u64,
	pub retryable_errors: Vec<String>,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		RetryPolicy {
			max_retries: 3,
			initial_delay_ms: 1000,
			retryable_errors: vec![IMAGERY_DOWNLOAD_ERROR.to_string()],
		}
	}
}

impl RetryPolicy {
	#[must_use]
	pub fn initial_delay(&self) -> Duration {
		Duration::from_millis(self.initial_delay_ms)
	}

	/// Delay after the failed attempt number `attempt` (starting at 0).
	#[must_use]
	pub fn backoff(&self, attempt: u32) -> Duration {
		self.initial_delay().saturating_mul(1u32 << attempt.min(16))
	}

	#[must_use]
	pub fn is_retryable(&self, err: &anyhow::Error) -> bool {
		err.chain().any(|cause| {
			let message = cause.to_string();
			self.retryable_errors.iter().any(|pattern| message.contains(pattern.as_str()))
		})
	}
}

/// Runs `operation` until it succeeds, fails with a non-retryable error or runs out of attempts.
///
/// The last error is returned unchanged, so callers still see what went wrong.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	ensure!(policy.max_retries > 0, "max_retries must be at least 1");

	let mut attempt = 0;
	loop {
		match operation().await {
			Ok(value) => return Ok(value),
			Err(err) => {
				let last = attempt + 1 >= policy.max_retries;
				if last || !policy.is_retryable(&err) {
					return Err(err);
				}
				let backoff = policy.backoff(attempt);
				log::warn!(
					"{label}: attempt {}/{} failed: {err}, retrying in {backoff:?}",
					attempt + 1,
					policy.max_retries
				);
				sleep(backoff).await;
				attempt += 1;
			}
		}
	}
}
