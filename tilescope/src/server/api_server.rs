//! Server lifecycle and composition.
//!
//! `ApiServer` builds the services from a [`Config`], composes the router, applies the
//! cross-cutting layers (CORS, backpressure, timeouts, panic catching), listens on a socket
//! and shuts down gracefully. Request handling lives in `handlers`, routing in `routes`.

use super::{cors, handlers::AppState, routes};
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
	BoxError, Router,
	error_handling::HandleErrorLayer,
	http::{HeaderValue, StatusCode, header::RETRY_AFTER},
	response::IntoResponse,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tilescope_buildings::{BuildingCache, BuildingDownloader, BuildingQuery};
use tilescope_core::utils::HttpFetcher;
use tilescope_imagery::{ImageryDownloader, TileUrlTemplate};
use tilescope_segment::{ArtifactStore, RemoteModel, SegmentationPredictor};
use tokio::{net::TcpListener, sync::oneshot};
use tower::{
	ServiceBuilder, buffer::BufferLayer, limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer,
};
use tower_http::catch_panic::CatchPanicLayer;

const DEFAULT_IP: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 300;
const GLOBAL_CONCURRENCY: usize = 256;
const GLOBAL_BUFFER: usize = 512;
/// Timeout for imagery tiles and building dataset files.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// The HTTP server.
///
/// Starting twice stops the previous instance first; stopping twice is a no-op.
pub struct ApiServer {
	ip: String,
	port: u16,
	use_api: bool,
	request_timeout: Duration,
	cors_allowed_origins: Vec<String>,
	cors_max_age_seconds: Option<u64>,
	state: AppState,
	exit_signal: Option<oneshot::Sender<()>>,
	join: Option<tokio::task::JoinHandle<()>>,
	local_addr: Option<SocketAddr>,
}

impl ApiServer {
	pub fn new(ip: &str, port: u16, state: AppState) -> ApiServer {
		ApiServer {
			ip: ip.to_string(),
			port,
			use_api: true,
			request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
			cors_allowed_origins: Vec::new(),
			cors_max_age_seconds: None,
			state,
			exit_signal: None,
			join: None,
			local_addr: None,
		}
	}

	/// Builds the services described by `config`.
	///
	/// Nothing is downloaded yet; the building dataset index is fetched on first use.
	pub fn from_config(config: &Config) -> Result<ApiServer> {
		let state = build_state(config)?;
		let server_config = &config.server;

		let mut server = ApiServer::new(
			server_config.ip.as_deref().unwrap_or(DEFAULT_IP),
			server_config.port.unwrap_or(DEFAULT_PORT),
			state,
		);
		server.use_api = !server_config.disable_api.unwrap_or(false);
		server.request_timeout =
			Duration::from_secs(server_config.request_timeout_seconds.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS));
		server.cors_allowed_origins.clone_from(&config.cors.allowed_origins);
		server.cors_max_age_seconds = config.cors.max_age_seconds;
		Ok(server)
	}

	/// The bound address while the server is running. Useful with port 0.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		self.local_addr
	}

	/// The complete service: routes, CORS and the protection layers.
	pub fn router(&self) -> Result<Router> {
		let mut router = routes::status_router();
		if self.use_api {
			router = router.merge(routes::api_router(self.state.clone()));
		}

		let cors_layer = cors::build_cors_layer(&self.cors_allowed_origins, self.cors_max_age_seconds)?;
		router = router.layer(cors_layer);

		// From innermost to outermost:
		//   LoadShed → ConcurrencyLimit → Buffer → Timeout → CatchPanic → HandleError
		// HandleErrorLayer is outermost so that the router sees an `Infallible` error type.
		let overload_handler = HandleErrorLayer::new(|err: BoxError| async move {
			log::warn!("request failed in the protection layers: {err}");
			let mut resp = (StatusCode::SERVICE_UNAVAILABLE, "Service overloaded, try later").into_response();
			resp.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static("2"));
			Ok::<_, std::convert::Infallible>(resp)
		});

		let protection = ServiceBuilder::new()
			.layer(overload_handler)
			.layer(CatchPanicLayer::new())
			.layer(TimeoutLayer::new(self.request_timeout))
			.layer(BufferLayer::new(GLOBAL_BUFFER))
			.layer(ConcurrencyLimitLayer::new(GLOBAL_CONCURRENCY))
			.layer(LoadShedLayer::new());

		Ok(router.layer(protection))
	}

	/// Starts listening and serving requests in a background task.
	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() || self.join.is_some() {
			self.stop().await;
		}

		log::info!("starting server");
		let router = self.router()?;

		let addr = format!("{}:{}", self.ip, self.port);
		let listener = TcpListener::bind(&addr)
			.await
			.with_context(|| format!("binding server to {addr}"))?;
		let local_addr = listener.local_addr()?;
		log::info!("server listening on {local_addr}");

		let (tx, rx) = oneshot::channel::<()>();
		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, router.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
			{
				log::error!("server task exited with error: {err}");
			}
		});

		self.exit_signal = Some(tx);
		self.join = Some(handle);
		self.local_addr = Some(local_addr);
		Ok(())
	}

	/// Triggers graceful shutdown and waits up to 10 seconds for the server task.
	pub async fn stop(&mut self) {
		if self.exit_signal.is_none() && self.join.is_none() {
			return;
		}

		log::info!("stopping server");
		if let Some(tx) = self.exit_signal.take() {
			let _ = tx.send(());
		}

		if let Some(handle) = self.join.take() {
			match tokio::time::timeout(Duration::from_secs(10), handle).await {
				Ok(Err(join_err)) => log::warn!("server task join error: {join_err}"),
				Ok(Ok(())) => {}
				Err(_) => log::warn!("server task did not shut down within timeout; continuing"),
			}
		}
		self.local_addr = None;
	}
}

fn build_state(config: &Config) -> Result<AppState> {
	let buildings = &config.buildings;
	let fetcher = HttpFetcher::new(DOWNLOAD_TIMEOUT)?;
	let cache = BuildingCache::open(&buildings.data_dir, &buildings.cache_dir)?;
	log::info!("building cache at {:?}", cache.dir());

	let downloader = BuildingDownloader::new(
		fetcher.clone(),
		cache.clone(),
		&buildings.dataset_url,
		buildings.zoom_level,
		buildings.concurrency,
	);
	let query = BuildingQuery::new(cache, buildings.zoom_level);

	Ok(AppState {
		segmentation: build_predictor(config, fetcher)?.map(Arc::new),
		downloader: Arc::new(downloader),
		query: Arc::new(query),
	})
}

fn build_predictor(config: &Config, fetcher: HttpFetcher) -> Result<Option<SegmentationPredictor>> {
	let segmentation = &config.segmentation;
	let Some(model_url) = segmentation.model_url.as_deref() else {
		log::warn!("no segmentation model configured, the segmentation endpoints are disabled");
		return Ok(None);
	};

	let model_fetcher = HttpFetcher::new(Duration::from_secs(segmentation.model_timeout_seconds))?;
	let model = RemoteModel::new(model_fetcher, model_url, &segmentation.text_model, &segmentation.point_model)?;
	log::info!("segmentation model at {model_url}");

	let template = TileUrlTemplate::new(&segmentation.imagery_source)?;
	let imagery = ImageryDownloader::new(fetcher, template).with_concurrency(segmentation.imagery_concurrency);

	let mut predictor = SegmentationPredictor::new(imagery, Arc::new(model))
		.with_limits(segmentation.limits())
		.with_retry(segmentation.retry.clone());
	if let Some(dir) = &segmentation.artifacts_dir {
		predictor = predictor.with_artifacts(ArtifactStore::open(dir)?);
		log::info!("keeping request artifacts in {dir:?}");
	}
	Ok(Some(predictor))
}
