use super::load_config;
use anyhow::Result;
use log::LevelFilter;
use std::path::PathBuf;
use tilescope::server::ApiServer;
use tokio::time::{Duration, sleep};

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true, verbatim_doc_comment)]
pub struct Subcommand {
	/// Path to a configuration file (YAML format) for the server, CORS, buildings and segmentation.
	/// Command line arguments override configuration file settings.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0)]
	pub config: Option<PathBuf>,

	/// Serve via socket ip. Default: 0.0.0.0
	#[arg(short = 'i', long, display_order = 0)]
	pub ip: Option<String>,

	/// Serve via port. Default: 8080
	#[arg(short, long, display_order = 0)]
	pub port: Option<u16>,

	/// Only serve /status
	#[arg(long, display_order = 1)]
	pub disable_api: Option<bool>,

	/// Shutdown server automatically after x milliseconds.
	#[arg(long, display_order = 2)]
	pub auto_shutdown: Option<u64>,
}

impl Subcommand {
	/// Log level set in the configuration file.
	pub fn configured_log_level(&self) -> Result<Option<LevelFilter>> {
		load_config(self.config.as_deref())?.logging.level_filter()
	}
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = load_config(arguments.config.as_deref())?;
	config.server.override_optional_ip(arguments.ip.as_deref());
	config.server.override_optional_port(arguments.port);
	config.server.override_optional_disable_api(arguments.disable_api);

	let mut server = ApiServer::from_config(&config)?;
	server.start().await?;
	if let Some(addr) = server.local_addr() {
		eprintln!("listening on http://{addr}");
	}

	if let Some(milliseconds) = arguments.auto_shutdown {
		sleep(Duration::from_millis(milliseconds)).await;
	} else {
		loop {
			sleep(Duration::from_secs(60)).await;
		}
	}

	server.stop().await;
	Ok(())
}
