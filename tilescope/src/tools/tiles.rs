use anyhow::{Context, Result};
use serde_json::json;
use tilescope_core::{GeoBBox, TileBBox, TileLimits};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// Bounding box as "west,south,east,north" in degrees
	#[arg(allow_hyphen_values = true)]
	pub bbox: String,

	/// Zoom level
	#[arg(short, long, default_value_t = 19)]
	pub zoom: u8,

	/// Also list the quadkeys of all tiles
	#[arg(long)]
	pub quadkeys: bool,

	/// Fail if the area needs more tiles than this
	#[arg(long)]
	pub max_tiles: Option<u64>,
}

pub fn parse_bbox(text: &str) -> Result<GeoBBox> {
	let values = text
		.split(',')
		.map(|v| v.trim().parse::<f64>())
		.collect::<Result<Vec<f64>, _>>()
		.with_context(|| format!("invalid bounding box '{text}'"))?;
	GeoBBox::try_from(values)
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let bbox = parse_bbox(&arguments.bbox)?;
	let zoom = arguments.zoom;

	if let Some(max_tiles) = arguments.max_tiles {
		let limits = TileLimits {
			max_tiles,
			..TileLimits::default()
		};
		limits.check_area(&bbox, zoom)?;
	}

	let tiles = TileBBox::from_geo(zoom, &bbox)?;
	let mut report = json!({
		"bbox": bbox.as_vec(),
		"zoom": zoom,
		"tiles": tiles.count(),
		"x_min": tiles.x_min,
		"y_min": tiles.y_min,
		"x_max": tiles.x_max,
		"y_max": tiles.y_max,
	});
	if arguments.quadkeys {
		let quadkeys: Vec<String> = tiles.quadkeys().map(|q| q.as_str().to_string()).collect();
		report["quadkeys"] = json!(quadkeys);
	}

	println!("{}", serde_json::to_string_pretty(&report)?);
	Ok(())
}
