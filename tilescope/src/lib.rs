//! # tilescope
//!
//! Building-footprint lookup and satellite-image segmentation served over HTTP.
//!
//! This crate glues the library crates together:
//! - [`config`] reads the YAML configuration of the server.
//! - [`server`] exposes the building and segmentation services as a JSON API.
//!
//! ```no_run
//! use tilescope::{config::Config, server::ApiServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_string("server:\n  port: 8000")?;
//!     let mut server = ApiServer::from_config(&config)?;
//!     server.start().await?;
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod server;

pub use tilescope_buildings as buildings;
pub use tilescope_core as core;
pub use tilescope_geometry as geometry;
pub use tilescope_imagery as imagery;
pub use tilescope_segment as segment;

/// Name reported by `/health`.
pub const SERVICE_NAME: &str = "tilescope";

/// Version reported by `/health`.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
