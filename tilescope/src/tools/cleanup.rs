use anyhow::Result;
use std::path::PathBuf;
use tilescope_segment::cleanup;

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true)]
pub struct Subcommand {
	/// Directory with segmentation artifacts (satellite_*.png, segment_*.png, segment_*.geojson)
	#[arg(default_value = ".")]
	pub dir: PathBuf,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let removed = cleanup(&arguments.dir)?;
	eprintln!("removed {removed} files from {:?}", arguments.dir);
	Ok(())
}
