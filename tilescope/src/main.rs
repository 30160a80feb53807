mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	#[clap(alias = "server")]
	/// Serve the building and segmentation API via http
	Serve(tools::serve::Subcommand),

	/// Show the map tiles covering a bounding box
	Tiles(tools::tiles::Subcommand),

	/// Download building footprints under the geometries of a GeoJSON file
	Download(tools::download::Subcommand),

	/// Find cached building footprints intersecting the geometries of a GeoJSON file
	Query(tools::query::Subcommand),

	/// Remove temporary segmentation files from a directory
	Cleanup(tools::cleanup::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	// A configured level can only make logging more verbose than the flags.
	let configured = match &cli.command {
		Commands::Serve(arguments) => arguments.configured_log_level()?,
		_ => None,
	};
	let level = configured.map_or(cli.verbose.log_level_filter(), |c| c.max(cli.verbose.log_level_filter()));

	env_logger::Builder::new()
		.filter_level(level)
		.format_timestamp(None)
		.init();

	run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
	match &cli.command {
		Commands::Serve(arguments) => tools::serve::run(arguments),
		Commands::Tiles(arguments) => tools::tiles::run(arguments),
		Commands::Download(arguments) => tools::download::run(arguments),
		Commands::Query(arguments) => tools::query::run(arguments),
		Commands::Cleanup(arguments) => tools::cleanup::run(arguments),
	}
}
