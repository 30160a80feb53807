//! tilescope server configuration.
//!
//! A YAML file passed with `serve -c FILE` is parsed into [`Config`]. Every section and
//! every field is optional; command line flags override the file.
//!
//! - [`ServerConfig`]: listening address and request limits
//! - [`CorsConfig`]: allowed browser origins
//! - [`BuildingsConfig`]: building dataset and local cache
//! - [`SegmentationConfig`]: model endpoint, imagery source, request limits and retries
//! - [`LoggingConfig`]: default log level

mod buildings;
mod cors;
mod logging;
mod main;
mod segmentation;
mod server;

pub use buildings::BuildingsConfig;
pub use cors::CorsConfig;
pub use logging::LoggingConfig;
pub use main::Config;
pub use segmentation::SegmentationConfig;
pub use server::ServerConfig;
