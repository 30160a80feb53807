//! GeoJSON helpers for detection results and building footprints.
//!
//! Features are exchanged as [`geojson`] types. Spatial predicates go through [`geo`].

mod bounds;
mod convert;
mod filter;
mod reproject;
mod stats;
mod vectorize;

pub use bounds::*;
pub use convert::*;
pub use filter::*;
pub use reproject::*;
pub use stats::*;
pub use vectorize::*;
