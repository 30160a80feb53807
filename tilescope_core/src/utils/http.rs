//! A small wrapper around a shared `reqwest::Client`.

use anyhow::{Context, Result, bail};
use reqwest::{Client, Url};
use std::time::Duration;

/// Fetches whole documents over HTTP(S). Cloning is cheap and shares the connection pool.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
	client: Client,
}

impl HttpFetcher {
	pub fn new(timeout: Duration) -> Result<HttpFetcher> {
		let client = Client::builder()
			.user_agent(concat!("tilescope/", env!("CARGO_PKG_VERSION")))
			.tcp_keepalive(Duration::from_secs(600))
			.timeout(timeout)
			.build()
			.context("building HTTP client")?;
		Ok(HttpFetcher { client })
	}

	#[must_use]
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// Downloads `url` and returns the body.
	///
	/// Non-success status codes are errors of the form `HTTP 404 Not Found for <url>`.
	pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
		let url = parse_url(url)?;
		log::trace!("GET {url}");

		let response = self
			.client
			.get(url.clone())
			.send()
			.await
			.with_context(|| format!("requesting {url}"))?;

		let status = response.status();
		if !status.is_success() {
			bail!("HTTP {status} for {url}");
		}

		let bytes = response
			.bytes()
			.await
			.with_context(|| format!("reading response body of {url}"))?;
		Ok(bytes.to_vec())
	}

	pub async fn get_text(&self, url: &str) -> Result<String> {
		let bytes = self.get_bytes(url).await?;
		String::from_utf8(bytes).with_context(|| format!("response of {url} is not UTF-8"))
	}

	/// Posts `body` with the given content type and returns the response body.
	pub async fn post_bytes(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<Vec<u8>> {
		let url = parse_url(url)?;
		log::trace!("POST {url} ({} bytes)", body.len());

		let response = self
			.client
			.post(url.clone())
			.header(reqwest::header::CONTENT_TYPE, content_type)
			.body(body)
			.send()
			.await
			.with_context(|| format!("posting to {url}"))?;

		let status = response.status();
		if !status.is_success() {
			let text = response.text().await.unwrap_or_default();
			bail!("HTTP {status} for {url}: {}", text.trim());
		}

		Ok(response
			.bytes()
			.await
			.with_context(|| format!("reading response body of {url}"))?
			.to_vec())
	}
}

fn parse_url(url: &str) -> Result<Url> {
	let parsed = Url::parse(url).with_context(|| format!("invalid URL '{url}'"))?;
	match parsed.scheme() {
		"http" | "https" => Ok(parsed),
		other => bail!("unsupported URL scheme '{other}' in '{url}', expected 'http' or 'https'"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{Router, body::Bytes, http::StatusCode, routing::get};
	use pretty_assertions::assert_eq;

	async fn serve(router: Router) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
		format!("http://{addr}")
	}

	fn fetcher() -> HttpFetcher {
		HttpFetcher::new(Duration::from_secs(5)).unwrap()
	}

	#[tokio::test]
	async fn get_bytes_and_text() {
		let base = serve(Router::new().route("/hello", get(|| async { "hello tiles" }))).await;
		let f = fetcher();
		assert_eq!(f.get_bytes(&format!("{base}/hello")).await.unwrap(), b"hello tiles");
		assert_eq!(f.get_text(&format!("{base}/hello")).await.unwrap(), "hello tiles");
	}

	#[tokio::test]
	async fn non_success_status_is_an_error() {
		let base = serve(Router::new().route("/gone", get(|| async { (StatusCode::NOT_FOUND, "nope") }))).await;
		let url = format!("{base}/gone");
		let err = fetcher().get_bytes(&url).await.unwrap_err();
		assert_eq!(err.to_string(), format!("HTTP 404 Not Found for {url}"));
	}

	#[tokio::test]
	async fn post_echoes() {
		let router = Router::new().route("/echo", axum::routing::post(|body: Bytes| async move { body }));
		let base = serve(router).await;
		let reply = fetcher()
			.post_bytes(&format!("{base}/echo"), "image/png", vec![1, 2, 3])
			.await
			.unwrap();
		assert_eq!(reply, vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn rejects_other_schemes() {
		let err = fetcher().get_bytes("ftp://example.org/x").await.unwrap_err();
		assert!(err.to_string().contains("unsupported URL scheme 'ftp'"));
	}
}
