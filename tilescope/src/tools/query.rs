use super::{load_config, read_geometries};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tilescope_buildings::{BuildingCache, BuildingQuery};

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

	/// Write the buildings to this file instead of stdout
	#[arg(short, long)]
	pub output: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let mut buildings = load_config(arguments.config.as_deref())?.buildings;
	if let Some(dir) = &arguments.data_dir {
		buildings.data_dir.clone_from(dir);
	}
	let geometries = read_geometries(&arguments.geojson)?;

	let cache = BuildingCache::open(&buildings.data_dir, &buildings.cache_dir)?;
	let result = BuildingQuery::new(cache, buildings.zoom_level).query(&geometries)?;
	eprintln!("found {} buildings", result.features.len());

	let json = serde_json::to_string(&result)?;
	match &arguments.output {
		Some(path) => std::fs::write(path, json).with_context(|| format!("Failed to write {path:?}"))?,
		None => println!("{json}"),
	}
	Ok(())
}
