//! Satellite imagery for segmentation requests.
//!
//! Imagery comes from any XYZ tile service. The tiles covering a bounding box are
//! downloaded concurrently, stitched into one mosaic and cropped to the box. The result
//! is a [`GeoRaster`]: an RGB image that knows its Web-Mercator extent.

mod downloader;
mod raster;
mod template;

pub use downloader::*;
pub use raster::*;
pub use template::*;
