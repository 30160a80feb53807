//! Object segmentation on satellite imagery.
//!
//! A request names an area, by bounding box or by prompt points, and what to look for.
//! [`SegmentationPredictor`] validates it, downloads the imagery, hands it to a
//! [`SegmentationModel`] and turns the returned mask into WGS84 GeoJSON polygons.

mod artifacts;
mod model;
mod predictor;
mod remote;
mod request;

pub use artifacts::*;
pub use model::*;
pub use predictor::*;
pub use remote::*;
pub use request::*;
