use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
	/// Minimum log level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
	/// `-v` flags on the command line can only make logging more verbose.
	pub level: Option<String>,
}

impl LoggingConfig {
	pub fn level_filter(&self) -> Result<Option<LevelFilter>> {
		self
			.level
			.as_deref()
			.map(|level| LevelFilter::from_str(level).with_context(|| format!("unknown log level '{level}'")))
			.transpose()
	}
}
