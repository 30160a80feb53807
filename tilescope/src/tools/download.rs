use super::{load_config, read_geometries};
use anyhow::Result;
use std::path::PathBuf;
use tilescope_buildings::{BuildingCache, BuildingDownloader};
use tilescope_core::utils::HttpFetcher;
use tokio::time::Duration;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// GeoJSON file with the areas of interest
	pub geojson: PathBuf,

	/// Configuration file (YAML); its `buildings` section is used
	#[arg(short = 'c', long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Override the data directory
	#[arg(short, long)]
	pub data_dir: Option<PathBuf>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut buildings = load_config(arguments.config.as_deref())?.buildings;
	if let Some(dir) = &arguments.data_dir {
		buildings.data_dir.clone_from(dir);
	}
	let geometries = read_geometries(&arguments.geojson)?;

	let cache = BuildingCache::open(&buildings.data_dir, &buildings.cache_dir)?;
	let downloader = BuildingDownloader::new(
		HttpFetcher::new(Duration::from_secs(120))?,
		cache,
		&buildings.dataset_url,
		buildings.zoom_level,
		buildings.concurrency,
	);

	let downloaded = downloader.download(&geometries).await?;
	eprintln!("downloaded {} building tiles", downloaded.len());
	println!("{}", serde_json::to_string_pretty(&downloaded)?);
	Ok(())
}
