//! Building footprints from the Bing global building-footprint dataset.
//!
//! The dataset is split into one file per level 9 quadkey, listed in `dataset-links.csv`.
//! [`BuildingDownloader`] fetches the files covering some geometries into a local
//! [`BuildingCache`], and [`BuildingQuery`] answers spatial queries from that cache.

mod cache;
mod dataset;
mod downloader;
mod query;

pub use cache::*;
pub use dataset::*;
pub use downloader::*;
pub use query::*;

/// Quadkey level the dataset is sharded by.
pub const DATASET_ZOOM_LEVEL: u8 = 9;

/// Location of the dataset's index of files.
pub const DATASET_LINKS_URL: &str = "https://minedbuildings.z5.web.core.windows.net/global-buildings/dataset-links.csv";
